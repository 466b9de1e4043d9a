use serde::Deserialize;

use super::Operations;
use crate::domain::{
    ActionError, AgentEnv, AttachedDisk, CloudError, DiskId, ImageId, PowerOp, VmCreateSpec,
    VmDiskOperation, VmId, VmSpec,
};

/// ここで作る VM はすべてこの名前（識別は VM id で行う）
const VM_NAME: &str = "bosh-vm";

const BOOT_DISK_NAME: &str = "boot-disk";

fn default_attached_disk_size_gb() -> u32 {
    16
}

/// `cloud_properties` of `create_vm`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VmCloudProperties {
    pub vm_flavor: String,
    /// エフェメラルなブートディスクの flavor
    pub disk_flavor: String,
    #[serde(default = "default_attached_disk_size_gb")]
    pub vm_attached_disk_size_gb: u32,
}

/// プロビジョニングパイプラインの入力
#[derive(Debug, Clone, PartialEq)]
pub struct VmProvision {
    pub agent_id: String,
    pub stemcell: ImageId,
    pub cloud: VmCloudProperties,
    pub networks: serde_json::Value,
    pub disk_cids: Vec<DiskId>,
    pub env: serde_json::Value,
}

impl Operations {
    /// プロビジョニング: 作成 → agent env のパッケージング → ISO アタッチ → 電源 ON
    pub async fn create_vm(&self, req: VmProvision) -> Result<VmId, ActionError> {
        let spec = VmCreateSpec {
            name: VM_NAME.to_string(),
            flavor: req.cloud.vm_flavor.clone(),
            source_image_id: req.stemcell.clone(),
            attached_disks: vec![AttachedDisk::ephemeral_boot(
                BOOT_DISK_NAME,
                req.cloud.disk_flavor.clone(),
                req.cloud.vm_attached_disk_size_gb,
            )],
            affinities: Vec::new(),
            tags: Vec::new(),
        };
        if !req.disk_cids.is_empty() {
            tracing::debug!(disks = req.disk_cids.len(), "persistent disks are attached separately");
        }

        let created = self
            .step("create vm", self.api.create_vm(&self.project, &spec))
            .await?;
        if created.entity.id.is_empty() {
            return Err(CloudError::internal(format!(
                "esxcloud: task '{}' finished without a VM id",
                created.id
            ))
            .into());
        }
        let vm_id = VmId::new(created.entity.id);

        let env = AgentEnv::new(
            req.agent_id,
            VmSpec {
                name: spec.name.clone(),
                id: vm_id.clone(),
            },
        )
        .with_agent_settings(
            self.agent.mbus.clone(),
            self.agent.ntp.clone(),
            self.agent.blobstore.clone(),
        )
        .with_deployment(req.networks, req.env);

        let iso = self.package_agent_env(&env).await?;
        self.step("attach iso", self.api.attach_iso(&vm_id, iso.path()))
            .await?;
        drop(iso);

        self.step("power on", self.api.vm_operation(&vm_id, &PowerOp::Start.into()))
            .await?;

        Ok(vm_id)
    }

    /// 削除: アタッチ済みディスクの探索 → 1 つずつデタッチ → 削除
    ///
    /// 電源 OFF はしない（前回の試行で停止済みの VM でリトライが失敗しないように）
    pub async fn delete_vm(&self, vm: &VmId) -> Result<(), ActionError> {
        let disks = self.get_disks(vm).await?;
        tracing::info!(vm = %vm, disks = disks.len(), "tearing down vm");

        for disk in disks {
            let op = VmDiskOperation::new(disk);
            self.step("detach disk", self.api.detach_disk(vm, &op)).await?;
        }

        self.step("delete vm", self.api.delete_vm(vm)).await?;
        Ok(())
    }

    pub async fn has_vm(&self, vm: &VmId) -> Result<bool, ActionError> {
        match self.api.get_vm(vm).await {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn restart_vm(&self, vm: &VmId) -> Result<(), ActionError> {
        self.step("restart vm", self.api.vm_operation(vm, &PowerOp::Restart.into()))
            .await?;
        Ok(())
    }
}

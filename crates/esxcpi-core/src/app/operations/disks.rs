use serde::Deserialize;

use super::Operations;
use crate::domain::resources::PERSISTENT_DISK;
use crate::domain::{ActionError, CloudError, DiskCreateSpec, DiskId, VmDiskOperation, VmId};

/// `cloud_properties` of `create_disk`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DiskCloudProperties {
    pub flavor: String,
}

/// 要求 MiB を GiB に切り上げ（リモート側の数え方に合わせて 1 GiB = 1000 MiB）
pub fn disk_size_gb(size_mb: u64) -> u64 {
    size_mb.div_ceil(1000)
}

impl Operations {
    /// サイズをローカルで検証してから project にディスクを作る
    pub async fn create_disk(
        &self,
        size_mb: u64,
        cloud: DiskCloudProperties,
        vm: Option<&VmId>,
    ) -> Result<DiskId, ActionError> {
        let size_gb = disk_size_gb(size_mb);
        if size_gb < 1 {
            return Err(ActionError::invalid(
                "Must provide a size in MiB that rounds up to at least 1 GiB for esxcloud",
            ));
        }
        let capacity_gb = u32::try_from(size_gb)
            .map_err(|_| ActionError::invalid(format!("disk size {size_mb} MiB is too large")))?;

        let spec = DiskCreateSpec {
            name: match vm {
                Some(vm) => format!("disk-for-vm-{vm}"),
                None => "bosh-disk".to_string(),
            },
            kind: PERSISTENT_DISK.to_string(),
            flavor: cloud.flavor,
            capacity_gb,
            affinities: Vec::new(),
            tags: Vec::new(),
        };

        let created = self
            .step("create disk", self.api.create_disk(&self.project, &spec))
            .await?;
        if created.entity.id.is_empty() {
            return Err(CloudError::internal(format!(
                "esxcloud: task '{}' finished without a disk id",
                created.id
            ))
            .into());
        }
        Ok(DiskId::new(created.entity.id))
    }

    pub async fn delete_disk(&self, disk: &DiskId) -> Result<(), ActionError> {
        self.step("delete disk", self.api.delete_disk(disk)).await?;
        Ok(())
    }

    pub async fn has_disk(&self, disk: &DiskId) -> Result<bool, ActionError> {
        match self.api.get_disk(disk).await {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn attach_disk(&self, vm: &VmId, disk: &DiskId) -> Result<(), ActionError> {
        let op = VmDiskOperation::new(disk.clone());
        self.step("attach disk", self.api.attach_disk(vm, &op)).await?;
        Ok(())
    }

    pub async fn detach_disk(&self, vm: &VmId, disk: &DiskId) -> Result<(), ActionError> {
        let op = VmDiskOperation::new(disk.clone());
        self.step("detach disk", self.api.detach_disk(vm, &op)).await?;
        Ok(())
    }

    /// `vm` を所属リストに含む永続ディスク（一覧の順）
    pub async fn get_disks(&self, vm: &VmId) -> Result<Vec<DiskId>, ActionError> {
        let all = self
            .api
            .list_disks(&self.project)
            .await?;
        Ok(all.attached_to(vm))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::operations::testing::{PROJECT, operations};
    use crate::domain::TaskState;
    use crate::impls::{ScriptedRemoteApi, ScriptedRunner};
    use rstest::rstest;
    use serde_json::json;
    use std::sync::Arc;

    #[rstest]
    #[case::zero(0, 0)]
    #[case::one_mb(1, 1)]
    #[case::exact(1000, 1)]
    #[case::just_over(1001, 2)]
    #[case::ten_gb(10_240, 11)]
    fn size_rounds_up(#[case] mb: u64, #[case] gb: u64) {
        assert_eq!(disk_size_gb(mb), gb);
    }

    fn flavor() -> DiskCloudProperties {
        DiskCloudProperties {
            flavor: "core-100".into(),
        }
    }

    #[tokio::test]
    async fn zero_size_is_rejected_before_any_remote_call() {
        let api = Arc::new(ScriptedRemoteApi::new());
        let ops = operations(api.clone(), Arc::new(ScriptedRunner::new()));

        let err = ops.create_disk(0, flavor(), Some(&VmId::new("vm-1"))).await.unwrap_err();

        assert!(matches!(err, ActionError::InvalidArgument(_)));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn create_disk_names_it_after_the_vm() {
        let api = Arc::new(ScriptedRemoteApi::new());
        api.task(format!("create_disk {PROJECT}"), "t1", "disk-1", TaskState::Completed);
        let ops = operations(api.clone(), Arc::new(ScriptedRunner::new()));

        let disk = ops.create_disk(2048, flavor(), Some(&VmId::new("vm-1"))).await.unwrap();

        assert_eq!(disk.as_str(), "disk-1");
        assert_eq!(
            api.calls()[0].body,
            Some(json!({
                "name": "disk-for-vm-vm-1",
                "kind": "persistent-disk",
                "flavor": "core-100",
                "capacityGb": 3
            }))
        );
    }

    #[tokio::test]
    async fn has_disk_maps_not_found_to_false() {
        let api = Arc::new(ScriptedRemoteApi::new());
        api.respond("get_disk d1", json!({"id": "d1"})).fail(
            "get_disk d2",
            CloudError::Business {
                code: "DiskNotFound".into(),
                message: "no disk".into(),
                data: Default::default(),
                http_status: 404,
            },
        );
        let ops = operations(api, Arc::new(ScriptedRunner::new()));

        assert!(ops.has_disk(&DiskId::new("d1")).await.unwrap());
        assert!(!ops.has_disk(&DiskId::new("d2")).await.unwrap());
    }

    #[tokio::test]
    async fn attach_then_detach() {
        let api = Arc::new(ScriptedRemoteApi::new());
        api.task("attach_disk vm-1 d1", "t-a", "vm-1", TaskState::Completed)
            .task("detach_disk vm-1 d1", "t-d", "vm-1", TaskState::Completed);
        let ops = operations(api.clone(), Arc::new(ScriptedRunner::new()));
        let (vm, disk) = (VmId::new("vm-1"), DiskId::new("d1"));

        ops.attach_disk(&vm, &disk).await.unwrap();
        ops.detach_disk(&vm, &disk).await.unwrap();

        assert_eq!(api.calls()[0].body, Some(json!({"diskId": "d1"})));
        assert_eq!(api.count("get_task t-d"), 1);
    }
}

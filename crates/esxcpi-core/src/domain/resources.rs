//! リモート API とやり取りするリソースの形
//!
//! パイプラインが扱う VM / ディスク / イメージの範囲だけをモデル化している。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::ids::{DiskId, ImageId, VmId};

/// 永続ディスクの kind
pub const PERSISTENT_DISK: &str = "persistent-disk";

/// VM ごとに作るエフェメラルなブートディスクの kind
pub const EPHEMERAL_DISK: &str = "ephemeral-disk";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalitySpec {
    pub kind: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedDisk {
    pub name: String,
    pub kind: String,
    pub flavor: String,
    pub capacity_gb: u32,
    pub boot_disk: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl AttachedDisk {
    /// VM と生死を共にするブートディスク
    pub fn ephemeral_boot(name: impl Into<String>, flavor: impl Into<String>, capacity_gb: u32) -> Self {
        Self {
            name: name.into(),
            kind: EPHEMERAL_DISK.to_string(),
            flavor: flavor.into(),
            capacity_gb,
            boot_disk: true,
            id: None,
            state: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmCreateSpec {
    pub name: String,
    pub flavor: String,
    pub source_image_id: ImageId,
    pub attached_disks: Vec<AttachedDisk>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub affinities: Vec<LocalitySpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// `POST /v1/vms/{id}/operations` が受け付ける電源操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerOp {
    Start,
    Stop,
    Restart,
}

impl PowerOp {
    pub fn as_str(self) -> &'static str {
        match self {
            PowerOp::Start => "START_VM",
            PowerOp::Stop => "STOP_VM",
            PowerOp::Restart => "RESTART_VM",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VmOperation {
    pub operation: String,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub arguments: serde_json::Map<String, serde_json::Value>,
}

impl From<PowerOp> for VmOperation {
    fn from(op: PowerOp) -> Self {
        Self {
            operation: op.as_str().to_string(),
            arguments: serde_json::Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmDiskOperation {
    pub disk_id: DiskId,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub arguments: serde_json::Map<String, serde_json::Value>,
}

impl VmDiskOperation {
    pub fn new(disk_id: DiskId) -> Self {
        Self {
            disk_id,
            arguments: serde_json::Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vm {
    pub id: VmId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub flavor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_image_id: Option<ImageId>,
    #[serde(default)]
    pub attached_disks: Vec<AttachedDisk>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskCreateSpec {
    pub name: String,
    pub kind: String,
    pub flavor: String,
    pub capacity_gb: u32,
    #[serde(
        default,
        rename = "localitySpec",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub affinities: Vec<LocalitySpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistentDisk {
    pub id: DiskId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub flavor: String,
    #[serde(default)]
    pub capacity_gb: u32,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub vms: Vec<VmId>,
}

impl PersistentDisk {
    pub fn is_attached_to(&self, vm: &VmId) -> bool {
        self.vms.iter().any(|v| v == vm)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskList {
    #[serde(default)]
    pub items: Vec<PersistentDisk>,
}

impl DiskList {
    /// 所属リストに `vm` を含むディスクの id（一覧の順）
    pub fn attached_to(&self, vm: &VmId) -> Vec<DiskId> {
        self.items
            .iter()
            .filter(|d| d.is_attached_to(vm))
            .map(|d| d.id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn vm_create_spec_wire_shape() {
        let spec = VmCreateSpec {
            name: "bosh-vm".into(),
            flavor: "core-100".into(),
            source_image_id: ImageId::new("img-1"),
            attached_disks: vec![AttachedDisk::ephemeral_boot("boot-disk", "core-disk", 16)],
            affinities: vec![],
            tags: vec![],
        };
        assert_eq!(
            serde_json::to_value(&spec).unwrap(),
            json!({
                "name": "bosh-vm",
                "flavor": "core-100",
                "sourceImageId": "img-1",
                "attachedDisks": [{
                    "name": "boot-disk",
                    "kind": "ephemeral-disk",
                    "flavor": "core-disk",
                    "capacityGb": 16,
                    "bootDisk": true
                }]
            })
        );
    }

    #[test]
    fn power_op_serializes_as_operation_name() {
        let op = VmOperation::from(PowerOp::Stop);
        assert_eq!(serde_json::to_value(&op).unwrap(), json!({"operation": "STOP_VM"}));
    }

    #[test]
    fn disk_list_filters_by_membership() {
        let list: DiskList = serde_json::from_value(json!({
            "items": [
                {"id": "d1", "vms": ["vm-1"]},
                {"id": "d2", "vms": ["vm-2"]},
                {"id": "d3", "vms": ["vm-2", "vm-1"]},
                {"id": "d4"}
            ]
        }))
        .unwrap();

        let ids: Vec<_> = list.attached_to(&VmId::new("vm-1")).into_iter().map(|d| d.into_string()).collect();
        assert_eq!(ids, vec!["d1", "d3"]);
    }
}

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Action, Args};
use crate::app::Operations;
use crate::app::operations::DiskCloudProperties;
use crate::domain::ids::{Disk, Vm};
use crate::domain::{ActionError, VmId};

/// `create_disk(size_mb, cloud_properties, vm_cid)`
pub struct CreateDisk;

#[async_trait]
impl Action for CreateDisk {
    fn name(&self) -> &'static str {
        "create_disk"
    }

    async fn invoke(&self, ops: &Operations, args: Args) -> Result<Value, ActionError> {
        args.expect_at_least(2)?;
        let size_mb: u64 = args.required(0, "size")?;
        let cloud: DiskCloudProperties = args.required(1, "cloud_properties")?;
        let vm: Option<VmId> = args.optional(2, "vm_cid")?;
        let disk = ops.create_disk(size_mb, cloud, vm.as_ref()).await?;
        Ok(json!(disk))
    }
}

/// `delete_disk(disk_cid)`
pub struct DeleteDisk;

#[async_trait]
impl Action for DeleteDisk {
    fn name(&self) -> &'static str {
        "delete_disk"
    }

    async fn invoke(&self, ops: &Operations, args: Args) -> Result<Value, ActionError> {
        let disk = args.id::<Disk>(0)?;
        ops.delete_disk(&disk).await?;
        Ok(Value::Null)
    }
}

/// `has_disk(disk_cid)`
pub struct HasDisk;

#[async_trait]
impl Action for HasDisk {
    fn name(&self) -> &'static str {
        "has_disk"
    }

    async fn invoke(&self, ops: &Operations, args: Args) -> Result<Value, ActionError> {
        let disk = args.id::<Disk>(0)?;
        Ok(Value::Bool(ops.has_disk(&disk).await?))
    }
}

/// `attach_disk(vm_cid, disk_cid)`
pub struct AttachDisk;

#[async_trait]
impl Action for AttachDisk {
    fn name(&self) -> &'static str {
        "attach_disk"
    }

    async fn invoke(&self, ops: &Operations, args: Args) -> Result<Value, ActionError> {
        let vm = args.id::<Vm>(0)?;
        let disk = args.id::<Disk>(1)?;
        ops.attach_disk(&vm, &disk).await?;
        Ok(Value::Null)
    }
}

/// `detach_disk(vm_cid, disk_cid)`
pub struct DetachDisk;

#[async_trait]
impl Action for DetachDisk {
    fn name(&self) -> &'static str {
        "detach_disk"
    }

    async fn invoke(&self, ops: &Operations, args: Args) -> Result<Value, ActionError> {
        let vm = args.id::<Vm>(0)?;
        let disk = args.id::<Disk>(1)?;
        ops.detach_disk(&vm, &disk).await?;
        Ok(Value::Null)
    }
}

/// `get_disks(vm_cid)`
pub struct GetDisks;

#[async_trait]
impl Action for GetDisks {
    fn name(&self) -> &'static str {
        "get_disks"
    }

    async fn invoke(&self, ops: &Operations, args: Args) -> Result<Value, ActionError> {
        let vm = args.id::<Vm>(0)?;
        let disks = ops.get_disks(&vm).await?;
        Ok(json!(disks))
    }
}

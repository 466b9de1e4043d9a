use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Action, Args};
use crate::app::Operations;
use crate::app::operations::{VmCloudProperties, VmProvision};
use crate::domain::ids::{Image, Vm};
use crate::domain::{ActionError, DiskId};

/// `create_vm(agent_id, stemcell_cid, cloud_properties, networks, disk_cids, env)`
pub struct CreateVm;

#[async_trait]
impl Action for CreateVm {
    fn name(&self) -> &'static str {
        "create_vm"
    }

    async fn invoke(&self, ops: &Operations, args: Args) -> Result<Value, ActionError> {
        args.expect_at_least(6)?;
        let req = VmProvision {
            agent_id: args.required(0, "agent_id")?,
            stemcell: args.id::<Image>(1)?,
            cloud: args.required::<VmCloudProperties>(2, "cloud_properties")?,
            networks: args.optional(3, "networks")?.unwrap_or(Value::Null),
            disk_cids: args.optional::<Vec<DiskId>>(4, "disk_cids")?.unwrap_or_default(),
            env: args.optional(5, "env")?.unwrap_or(Value::Null),
        };
        let vm = ops.create_vm(req).await?;
        Ok(json!(vm))
    }
}

/// `delete_vm(vm_cid)`
pub struct DeleteVm;

#[async_trait]
impl Action for DeleteVm {
    fn name(&self) -> &'static str {
        "delete_vm"
    }

    async fn invoke(&self, ops: &Operations, args: Args) -> Result<Value, ActionError> {
        let vm = args.id::<Vm>(0)?;
        ops.delete_vm(&vm).await?;
        Ok(Value::Null)
    }
}

/// `has_vm(vm_cid)`
pub struct HasVm;

#[async_trait]
impl Action for HasVm {
    fn name(&self) -> &'static str {
        "has_vm"
    }

    async fn invoke(&self, ops: &Operations, args: Args) -> Result<Value, ActionError> {
        let vm = args.id::<Vm>(0)?;
        Ok(Value::Bool(ops.has_vm(&vm).await?))
    }
}

/// `restart_vm(vm_cid)`
pub struct RestartVm;

#[async_trait]
impl Action for RestartVm {
    fn name(&self) -> &'static str {
        "restart_vm"
    }

    async fn invoke(&self, ops: &Operations, args: Args) -> Result<Value, ActionError> {
        let vm = args.id::<Vm>(0)?;
        ops.restart_vm(&vm).await?;
        Ok(Value::Null)
    }
}

/// `set_vm_metadata(vm_cid, metadata)`: 受け付けて何もしない
pub struct SetVmMetadata;

#[async_trait]
impl Action for SetVmMetadata {
    fn name(&self) -> &'static str {
        "set_vm_metadata"
    }

    async fn invoke(&self, _ops: &Operations, args: Args) -> Result<Value, ActionError> {
        let vm: Option<String> = args.optional(0, "vm_cid")?;
        tracing::info!(
            vm = vm.as_deref().unwrap_or("<none>"),
            "set_vm_metadata called; VM metadata is not stored"
        );
        Ok(Value::Null)
    }
}

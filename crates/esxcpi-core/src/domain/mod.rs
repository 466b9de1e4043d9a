//! Domain - リモートのタスクとリソース、エラー分類、アクションプロトコルのエンベロープ

pub mod agent_env;
pub mod envelope;
pub mod errors;
pub mod ids;
pub mod policy;
pub mod resources;
pub mod task;

pub use self::agent_env::{AgentEnv, BlobstoreSpec, VmSpec};
pub use self::envelope::{BoshErrorType, Request, Response, ResponseError};
pub use self::errors::{ActionError, ApiError, CloudError};
pub use self::ids::{DiskId, Id, IdMarker, ImageId, TaskId, VmId};
pub use self::policy::PollPolicy;
pub use self::resources::{
    AttachedDisk, DiskCreateSpec, DiskList, LocalitySpec, PersistentDisk, PowerOp, Vm,
    VmCreateSpec, VmDiskOperation, VmOperation,
};
pub use self::task::{Entity, Step, Task, TaskState};

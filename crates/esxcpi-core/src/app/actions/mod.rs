//! Actions - 呼び出し側が名前で叩くエントリポイント
//!
//! 各アクションは位置引数をデコードし、[`Operations`] のパイプラインを 1 本実行して
//! JSON の結果を返す。[`ActionTable`] に型消去して格納し、Dispatcher が名前で引く。

mod args;
mod disks;
mod registry;
mod stemcells;
mod vms;

pub use self::args::Args;
pub use self::disks::{AttachDisk, CreateDisk, DeleteDisk, DetachDisk, GetDisks, HasDisk};
pub use self::registry::{ActionTable, RegistryError};
pub use self::stemcells::{CreateStemcell, DeleteStemcell};
pub use self::vms::{CreateVm, DeleteVm, HasVm, RestartVm, SetVmMetadata};

use async_trait::async_trait;

use crate::app::Operations;
use crate::domain::ActionError;

#[async_trait]
pub trait Action: Send + Sync {
    /// 呼び出し側が使う名前（大文字小文字を区別しない）
    fn name(&self) -> &'static str;

    async fn invoke(&self, ops: &Operations, args: Args) -> Result<serde_json::Value, ActionError>;
}

impl ActionTable {
    /// この CPI が実装する全アクション
    pub fn standard() -> Result<Self, RegistryError> {
        ActionTable::new()
            .with(CreateStemcell)?
            .with(DeleteStemcell)?
            .with(CreateDisk)?
            .with(DeleteDisk)?
            .with(HasDisk)?
            .with(AttachDisk)?
            .with(DetachDisk)?
            .with(GetDisks)?
            .with(CreateVm)?
            .with(DeleteVm)?
            .with(HasVm)?
            .with(RestartVm)?
            .with(SetVmMetadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_is_complete() {
        let table = ActionTable::standard().unwrap();
        assert_eq!(
            table.registered(),
            vec![
                "attach_disk",
                "create_disk",
                "create_stemcell",
                "create_vm",
                "delete_disk",
                "delete_stemcell",
                "delete_vm",
                "detach_disk",
                "get_disks",
                "has_disk",
                "has_vm",
                "restart_vm",
                "set_vm_metadata",
            ]
        );
    }
}

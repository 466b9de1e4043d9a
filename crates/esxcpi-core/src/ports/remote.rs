//! RemoteApi port - リモートのインフラ管理 API
//!
//! 変更系の呼び出しは終端まで追跡すべき [`Task`] を返し、参照系はリソースそのものを返す。
//! 失敗はすべて [`CloudError`] に分類済み。

use async_trait::async_trait;
use std::path::Path;

use crate::domain::{
    CloudError, DiskCreateSpec, DiskId, DiskList, ImageId, PersistentDisk, Task,
    TaskId, Vm, VmCreateSpec, VmDiskOperation, VmId, VmOperation,
};

#[async_trait]
pub trait RemoteApi: Send + Sync {
    // ----- タスク -----
    async fn get_task(&self, id: &TaskId) -> Result<Task, CloudError>;

    // ----- VM -----
    async fn create_vm(&self, project: &str, spec: &VmCreateSpec) -> Result<Task, CloudError>;

    async fn get_vm(&self, id: &VmId) -> Result<Vm, CloudError>;

    /// 強制削除（アタッチ済みメディアも一緒に消える）
    async fn delete_vm(&self, id: &VmId) -> Result<Task, CloudError>;

    async fn vm_operation(&self, id: &VmId, op: &VmOperation) -> Result<Task, CloudError>;

    async fn attach_disk(&self, id: &VmId, op: &VmDiskOperation) -> Result<Task, CloudError>;

    async fn detach_disk(&self, id: &VmId, op: &VmDiskOperation) -> Result<Task, CloudError>;

    /// `iso` の ISO ファイルをアップロードして VM にアタッチ
    async fn attach_iso(&self, id: &VmId, iso: &Path) -> Result<Task, CloudError>;

    // ----- ディスク -----
    async fn create_disk(&self, project: &str, spec: &DiskCreateSpec) -> Result<Task, CloudError>;

    async fn get_disk(&self, id: &DiskId) -> Result<PersistentDisk, CloudError>;

    /// 強制削除
    async fn delete_disk(&self, id: &DiskId) -> Result<Task, CloudError>;

    /// プロジェクトのディスク全件
    async fn list_disks(&self, project: &str) -> Result<DiskList, CloudError>;

    // ----- イメージ -----
    /// `image` のイメージファイルをアップロード（`name` は説明用）
    async fn create_image(&self, image: &Path, name: &str) -> Result<Task, CloudError>;

    async fn delete_image(&self, id: &ImageId) -> Result<Task, CloudError>;
}

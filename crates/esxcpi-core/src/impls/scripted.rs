//! 台本付きフェイク（テスト用）
//!
//! # 学習ポイント
//! - `ScriptedRemoteApi` は呼び出しキーごとのキューから応答を返し、全呼び出しを記録する
//! - キューの最後の応答は繰り返し返すので、「終わらないタスク」は 1 行で書ける
//! - 統合テスト（`tests/`）からも使うため `#[cfg(test)]` にはしていない
//!
//! 呼び出しキー:
//! - `get_task <task>`
//! - `create_vm <project>` / `get_vm <vm>` / `delete_vm <vm>`
//! - `vm_operation <vm> <OPERATION>`
//! - `attach_disk <vm> <disk>` / `detach_disk <vm> <disk>` / `attach_iso <vm>`
//! - `create_disk <project>` / `get_disk <disk>` / `delete_disk <disk>` / `list_disks <project>`
//! - `create_image` / `delete_image <image>`

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::domain::{
    CloudError, DiskCreateSpec, DiskId, DiskList, ImageId, PersistentDisk, Task,
    TaskId, TaskState, Vm, VmCreateSpec, VmDiskOperation, VmId, VmOperation,
};
use crate::ports::{CommandOutput, CommandRunner, RemoteApi};

/// 記録された呼び出し 1 件（キーと、あれば送信した JSON ボディ）
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub key: String,
    pub body: Option<serde_json::Value>,
}

#[derive(Default)]
struct Script {
    responses: HashMap<String, VecDeque<Result<serde_json::Value, CloudError>>>,
    calls: Vec<RecordedCall>,
}

#[derive(Default)]
pub struct ScriptedRemoteApi {
    script: Mutex<Script>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ScriptedRemoteApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// `key` に成功応答を積む
    pub fn respond(&self, key: impl Into<String>, value: impl Serialize) -> &Self {
        let value = serde_json::to_value(value).map_err(CloudError::internal);
        self.push(key.into(), value);
        self
    }

    /// `key` に失敗を積む
    pub fn fail(&self, key: impl Into<String>, err: CloudError) -> &Self {
        self.push(key.into(), Err(err));
        self
    }

    /// 変更系の呼び出しが即座に `task_id` を返し、そのタスクの 1 回目のポーリングで
    /// `entity` の `final_state` を返すように仕込む
    pub fn task(&self, key: impl Into<String>, task_id: &str, entity: &str, final_state: TaskState) -> &Self {
        self.respond(key, queued(task_id, entity));
        let done = Task {
            state: final_state,
            ..queued(task_id, entity)
        };
        self.respond(format!("get_task {task_id}"), done)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.script).calls.clone()
    }

    pub fn call_keys(&self) -> Vec<String> {
        lock(&self.script).calls.iter().map(|c| c.key.clone()).collect()
    }

    pub fn count(&self, key: &str) -> usize {
        lock(&self.script).calls.iter().filter(|c| c.key == key).count()
    }

    fn push(&self, key: String, response: Result<serde_json::Value, CloudError>) {
        lock(&self.script)
            .responses
            .entry(key)
            .or_default()
            .push_back(response);
    }

    fn answer<T: DeserializeOwned>(&self, key: String, body: Option<serde_json::Value>) -> Result<T, CloudError> {
        let response = {
            let mut script = lock(&self.script);
            script.calls.push(RecordedCall {
                key: key.clone(),
                body,
            });
            match script.responses.get_mut(&key) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match response {
            Some(Ok(value)) => serde_json::from_value(value).map_err(CloudError::internal),
            Some(Err(err)) => Err(err),
            None => Err(CloudError::internal(format!("unscripted call: {key}"))),
        }
    }
}

fn queued(task_id: &str, entity: &str) -> Task {
    Task::new(task_id, "SCRIPTED", TaskState::Queued).with_entity(entity, "")
}

fn body(value: &impl Serialize) -> Option<serde_json::Value> {
    serde_json::to_value(value).ok()
}

#[async_trait]
impl RemoteApi for ScriptedRemoteApi {
    async fn get_task(&self, id: &TaskId) -> Result<Task, CloudError> {
        self.answer(format!("get_task {id}"), None)
    }

    async fn create_vm(&self, project: &str, spec: &VmCreateSpec) -> Result<Task, CloudError> {
        self.answer(format!("create_vm {project}"), body(spec))
    }

    async fn get_vm(&self, id: &VmId) -> Result<Vm, CloudError> {
        self.answer(format!("get_vm {id}"), None)
    }

    async fn delete_vm(&self, id: &VmId) -> Result<Task, CloudError> {
        self.answer(format!("delete_vm {id}"), None)
    }

    async fn vm_operation(&self, id: &VmId, op: &VmOperation) -> Result<Task, CloudError> {
        self.answer(format!("vm_operation {id} {}", op.operation), body(op))
    }

    async fn attach_disk(&self, id: &VmId, op: &VmDiskOperation) -> Result<Task, CloudError> {
        self.answer(format!("attach_disk {id} {}", op.disk_id), body(op))
    }

    async fn detach_disk(&self, id: &VmId, op: &VmDiskOperation) -> Result<Task, CloudError> {
        self.answer(format!("detach_disk {id} {}", op.disk_id), body(op))
    }

    async fn attach_iso(&self, id: &VmId, iso: &Path) -> Result<Task, CloudError> {
        let contents = std::fs::read_to_string(iso).ok().map(serde_json::Value::String);
        self.answer(format!("attach_iso {id}"), contents)
    }

    async fn create_disk(&self, project: &str, spec: &DiskCreateSpec) -> Result<Task, CloudError> {
        self.answer(format!("create_disk {project}"), body(spec))
    }

    async fn get_disk(&self, id: &DiskId) -> Result<PersistentDisk, CloudError> {
        self.answer(format!("get_disk {id}"), None)
    }

    async fn delete_disk(&self, id: &DiskId) -> Result<Task, CloudError> {
        self.answer(format!("delete_disk {id}"), None)
    }

    async fn list_disks(&self, project: &str) -> Result<DiskList, CloudError> {
        self.answer(format!("list_disks {project}"), None)
    }

    async fn create_image(&self, image: &Path, _name: &str) -> Result<Task, CloudError> {
        let contents = std::fs::read(image)
            .ok()
            .map(|b| serde_json::Value::String(String::from_utf8_lossy(&b).into_owned()));
        self.answer("create_image".to_string(), contents)
    }

    async fn delete_image(&self, id: &ImageId) -> Result<Task, CloudError> {
        self.answer(format!("delete_image {id}"), None)
    }
}

/// フェイクのコマンド実行
///
/// 成功時は最後の引数のファイル（ISO の入力）を `-o` の次のパスにコピーする。
/// 呼び出し側は期待どおり出力ファイルを見つけられる。
#[derive(Default)]
pub struct ScriptedRunner {
    failure: Option<String>,
    invocations: Mutex<Vec<Vec<String>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// 毎回 `stderr` 付きで非ゼロ終了する
    pub fn failing(stderr: impl Into<String>) -> Self {
        Self {
            failure: Some(stderr.into()),
            invocations: Mutex::new(Vec::new()),
        }
    }

    /// 実行ごとの `[program, args...]`
    pub fn invocations(&self) -> Vec<Vec<String>> {
        lock(&self.invocations).clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, program: &str, args: &[String]) -> std::io::Result<CommandOutput> {
        let mut invocation = vec![program.to_string()];
        invocation.extend(args.iter().cloned());
        lock(&self.invocations).push(invocation);

        if let Some(stderr) = &self.failure {
            return Ok(CommandOutput {
                success: false,
                stdout: String::new(),
                stderr: stderr.clone(),
            });
        }

        let output = args.iter().position(|a| a == "-o").and_then(|i| args.get(i + 1));
        if let (Some(output), Some(input)) = (output, args.last()) {
            tokio::fs::copy(input, output).await?;
        }

        Ok(CommandOutput {
            success: true,
            ..CommandOutput::default()
        })
    }
}

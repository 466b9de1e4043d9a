//! リモートタスクのスナップショット
//!
//! リモート API の変更系の呼び出しは、バックグラウンド処理を表す `Task` を返す。
//! 状態が終端になるまでポーリングする。

use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::ApiError;
use super::ids::TaskId;

/// リモート側が報告するタスク状態
///
/// 未知の値はそのまま通す（新しいサーバでもデコードが壊れない）。
///
/// 状態遷移:
/// - Queued -> Started -> Completed
/// - Queued -> Started -> Error
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskState {
    Queued,
    Started,
    Completed,
    Error,
    Other(String),
}

impl TaskState {
    /// 終端状態か（これ以上遷移しない）
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Error)
    }

    pub fn as_str(&self) -> &str {
        match self {
            TaskState::Queued => "QUEUED",
            TaskState::Started => "STARTED",
            TaskState::Completed => "COMPLETED",
            TaskState::Error => "ERROR",
            TaskState::Other(s) => s,
        }
    }
}

impl From<String> for TaskState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "QUEUED" => TaskState::Queued,
            "STARTED" => TaskState::Started,
            "COMPLETED" => TaskState::Completed,
            "ERROR" => TaskState::Error,
            _ => TaskState::Other(s),
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TaskState {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TaskState {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(TaskState::from)
    }
}

/// タスクが操作するエンティティ（作成された VM、ディスク、イメージなど）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub kind: String,
}

/// タスクの 1 ステップ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub operation: String,
    pub state: TaskState,
    #[serde(default)]
    pub sequence: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ApiError>,
}

/// リモートタスクの不変スナップショット
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    #[serde(default)]
    pub operation: String,
    pub state: TaskState,
    #[serde(default)]
    pub entity: Entity,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queued_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
}

impl Task {
    pub fn new(id: impl Into<TaskId>, operation: impl Into<String>, state: TaskState) -> Self {
        Self {
            id: id.into(),
            operation: operation.into(),
            state,
            entity: Entity::default(),
            steps: Vec::new(),
            queued_time: None,
            started_time: None,
            end_time: None,
            self_link: None,
        }
    }

    pub fn with_entity(mut self, id: impl Into<String>, kind: impl Into<String>) -> Self {
        self.entity = Entity {
            id: id.into(),
            kind: kind.into(),
        };
        self
    }

    /// 各ステップが報告したエラー（ステップ順）
    pub fn step_errors(&self) -> impl Iterator<Item = &ApiError> {
        self.steps.iter().flat_map(|s| s.errors.iter())
    }
}

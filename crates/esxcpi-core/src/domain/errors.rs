//! エラー分類
//!
//! `CloudError` はリモート側が起こしうる失敗の閉じた集合。
//! `ActionError` はアクションが Dispatcher に返すもので、cloud エラーか、
//! リモートに届かなかったローカルの失敗のどちらか。

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::envelope::BoshErrorType;
use super::ids::TaskId;
use super::task::Task;

/// リモート API の構造化エラーボディ
///
/// `code` と `message` は必須。欠けているボディはビジネスエラーではない。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CloudError {
    /// リモート側がリクエストを明示的に拒否した
    #[error(
        "esxcloud: {{ HTTP status: '{http_status}', code: '{code}', message: '{message}', data: '{}' }}",
        display_data(.data)
    )]
    Business {
        code: String,
        message: String,
        data: serde_json::Map<String, serde_json::Value>,
        http_status: u16,
    },

    /// 想定外の HTTP 層の失敗。レスポンス自体がなければ `http_status` は `None`
    #[error("esxcloud: HTTP {}: {raw_body}", display_status(.http_status))]
    Transport {
        http_status: Option<u16>,
        raw_body: String,
    },

    /// タスクが ERROR になった。`task` はステップのエラーを含む最終スナップショット
    #[error("esxcloud: Task '{}' is in error state. Examine task for full details.", .task.id)]
    TaskFailed { task: Box<Task> },

    #[error(
        "esxcloud: Timed out waiting for task '{task_id}'. Task may not be in error state, examine task for full details."
    )]
    TaskTimeout { task_id: TaskId },

    /// ローカルの障害（シリアライズ失敗や回復したパニック）
    #[error("{cause}")]
    Internal { cause: String },
}

impl CloudError {
    pub fn business(api: ApiError, http_status: u16) -> Self {
        CloudError::Business {
            code: api.code,
            message: api.message,
            data: api.data,
            http_status,
        }
    }

    pub fn task_failed(task: Task) -> Self {
        CloudError::TaskFailed { task: Box::new(task) }
    }

    pub fn internal(cause: impl std::fmt::Display) -> Self {
        CloudError::Internal {
            cause: cause.to_string(),
        }
    }

    pub fn is_business(&self) -> bool {
        matches!(self, CloudError::Business { .. })
    }

    /// 対象のエンティティが存在しないとリモート側が答えた
    ///
    /// 構造化された 404 だけが対象（プロキシの素の 404 はエンティティについて何も言っていない）
    pub fn is_not_found(&self) -> bool {
        matches!(self, CloudError::Business { http_status: 404, .. })
    }
}

fn display_data(data: &serde_json::Map<String, serde_json::Value>) -> String {
    serde_json::Value::Object(data.clone()).to_string()
}

fn display_status(status: &Option<u16>) -> String {
    status.map_or_else(|| "error".to_string(), |s| s.to_string())
}

/// アクション呼び出し 1 回の失敗
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Cloud(#[from] CloudError),

    /// リモート呼び出しの前にローカルで拒否
    #[error("{0}")]
    InvalidArgument(String),

    /// 呼び出し側が送出する型付きエラー（種別とリトライ可否はそのまま使う）
    #[error("{message}")]
    Bosh {
        kind: BoshErrorType,
        can_retry: bool,
        message: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("command '{program}' failed: {output}")]
    Command { program: String, output: String },
}

impl ActionError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ActionError::InvalidArgument(message.into())
    }

    pub fn not_implemented(method: &str) -> Self {
        ActionError::Bosh {
            kind: BoshErrorType::NotImplemented,
            can_retry: false,
            message: format!("Method {method} not implemented in esxcloud CPI."),
        }
    }

    /// アクション外のセットアップ失敗（stdin、リクエストのデコード、設定）
    pub fn cpi(context: impl std::fmt::Display, cause: impl std::fmt::Display) -> Self {
        ActionError::Bosh {
            kind: BoshErrorType::CpiError,
            can_retry: false,
            message: format!("CPI error: '{context}' | Caused by: '{cause}'"),
        }
    }
}

impl From<serde_json::Error> for ActionError {
    fn from(e: serde_json::Error) -> Self {
        ActionError::Cloud(CloudError::internal(e))
    }
}

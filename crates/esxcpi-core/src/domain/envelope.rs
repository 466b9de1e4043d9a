//! アクションプロトコル - リクエスト 1 件、レスポンスエンベロープ 1 件

use serde::{Deserialize, Serialize};

/// オーケストレータが理解するエラー種別名
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoshErrorType {
    #[serde(rename = "Bosh::Clouds::CloudError")]
    CloudError,
    #[serde(rename = "Bosh::Clouds::CpiError")]
    CpiError,
    #[serde(rename = "Bosh::Clouds::NotImplemented")]
    NotImplemented,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub method: String,
    #[serde(default)]
    pub arguments: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
    #[serde(rename = "type")]
    pub kind: BoshErrorType,
    pub message: String,
    #[serde(rename = "ok_to_retry")]
    pub can_retry: bool,
}

/// 呼び出しごとに 1 件だけ書き出すエンベロープ
///
/// ワイヤ上には `result` と `error` が常に両方あり、使わない方は `null`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub result: serde_json::Value,
    #[serde(default)]
    pub error: Option<ResponseError>,
    #[serde(default)]
    pub log: String,
}

impl Response {
    pub fn success(result: serde_json::Value, log: String) -> Self {
        Self {
            result,
            error: None,
            log,
        }
    }

    pub fn failure(error: ResponseError, log: String) -> Self {
        Self {
            result: serde_json::Value::Null,
            error: Some(error),
            log,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

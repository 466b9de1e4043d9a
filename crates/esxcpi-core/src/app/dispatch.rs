//! Dispatcher - リクエスト 1 件に対してレスポンスエンベロープを必ず 1 件返す
//!
//! # 処理の流れ
//! 1. 小文字化した名前でアクションを引く（未登録 → `NotImplemented`）
//! 2. 呼び出し単位の [`LogTrail`] を subscriber にしてパニック回復付きで実行
//! 3. 結果を `{result, error, log}` に詰める
//!
//! # リトライ判定
//! `ok_to_retry` を決めるのは [`response_error`] だけ。全バリアントを明示的に
//! match するので、バリアントを足すと分類するまでここでビルドが通らない。
//!
//! # パニック
//! アクション内の通常のパニックは回復し、リトライ不可の `CpiError` として返す。
//! ペイロードが [`SevereFault`] のパニックはそのまま再送出する。

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::instrument::WithSubscriber;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::{Layer, SubscriberExt};

use crate::app::Operations;
use crate::app::actions::{ActionTable, Args};
use crate::app::trail::LogTrail;
use crate::domain::{ActionError, BoshErrorType, CloudError, Request, Response, ResponseError};
use crate::ports::Clock;

/// Dispatcher で回復してはいけないパニックのペイロード
///
/// `std::panic::panic_any(SevereFault::new("..."))` で送出する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SevereFault(pub String);

impl SevereFault {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

pub struct Dispatcher {
    table: ActionTable,
    clock: Arc<dyn Clock>,
    mirror: bool,
}

impl Dispatcher {
    pub fn new(table: ActionTable, clock: Arc<dyn Clock>) -> Self {
        Self {
            table,
            clock,
            mirror: false,
        }
    }

    /// 呼び出し中のイベントを stderr にも出す（`RUST_LOG` でフィルタ）
    pub fn mirror_to_stderr(mut self, enabled: bool) -> Self {
        self.mirror = enabled;
        self
    }

    pub async fn handle(&self, ops: &Operations, request: Request) -> Response {
        self.dispatch(ops, &request.method, request.arguments).await
    }

    pub async fn dispatch(&self, ops: &Operations, method: &str, args: Vec<serde_json::Value>) -> Response {
        let trail = LogTrail::new(self.clock.clone());
        let mirror = self.mirror.then(|| {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(stderr_filter())
        });
        let subscriber = tracing_subscriber::registry().with(trail.clone()).with(mirror);

        let outcome = self.run(ops, method, args).with_subscriber(subscriber).await;

        let log = trail.contents();
        match outcome {
            Ok(result) => Response::success(result, log),
            Err(error) => Response::failure(error, log),
        }
    }

    async fn run(
        &self,
        ops: &Operations,
        method: &str,
        args: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value, ResponseError> {
        tracing::info!("Starting {method}");
        tracing::info!("Arguments: {}", serde_json::Value::Array(args.clone()));

        let Some(action) = self.table.get(method) else {
            let err = ActionError::not_implemented(method);
            tracing::error!("{err}");
            return Err(response_error(&err));
        };

        let outcome = AssertUnwindSafe(action.invoke(ops, Args::new(args)))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(result)) => {
                tracing::info!("Result: {result}");
                tracing::info!("Ending {method}");
                Ok(result)
            }
            Ok(Err(err)) => {
                tracing::error!("{method} failed: {err}");
                Err(response_error(&err))
            }
            Err(payload) => {
                if payload.is::<SevereFault>() {
                    std::panic::resume_unwind(payload);
                }
                let message = panic_message(payload.as_ref());
                tracing::error!("{method} panicked: {message}");
                let err = ActionError::Cloud(CloudError::internal(format!(
                    "Recovered panic in {method}: {message}"
                )));
                Err(response_error(&err))
            }
        }
    }
}

/// アクションが起こしうる全失敗のエラー種別とリトライ可否
pub fn response_error(err: &ActionError) -> ResponseError {
    let (kind, can_retry) = match err {
        ActionError::Cloud(cloud) => match cloud {
            CloudError::Business { .. } => (BoshErrorType::CloudError, false),
            CloudError::TaskFailed { .. } => (BoshErrorType::CloudError, false),
            CloudError::Transport { .. } => (BoshErrorType::CloudError, true),
            CloudError::TaskTimeout { .. } => (BoshErrorType::CloudError, true),
            CloudError::Internal { .. } => (BoshErrorType::CpiError, false),
        },
        ActionError::InvalidArgument(_) => (BoshErrorType::CpiError, false),
        ActionError::Io(_) => (BoshErrorType::CpiError, false),
        ActionError::Command { .. } => (BoshErrorType::CpiError, false),
        ActionError::Bosh { kind, can_retry, .. } => (*kind, *can_retry),
    };

    ResponseError {
        kind,
        message: err.to_string(),
        can_retry,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn stderr_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

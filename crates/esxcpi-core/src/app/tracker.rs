//! TaskTracker - リモートタスクが終端状態になるまでポーリング
//!
//! # ループ
//! 全体タイムアウトまでの間:
//! - タスクを取得する
//! - COMPLETED → 完了、ERROR → `TaskFailed`、それ以外 → ポーリング継続
//! - ポーリングがビジネスエラーなら即座に返す
//! - それ以外の失敗は連続失敗として `max_retries` に数え、超えたらそのまま返す
//!
//! 失敗カウンタはポーリング成功のたびに 0 に戻る。時間切れ（またはキャンセル）は
//! `TaskTimeout`。

use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{Instant, sleep_until};

use crate::domain::{CloudError, PollPolicy, Task, TaskId, TaskState};
use crate::ports::RemoteApi;

#[derive(Clone)]
pub struct TaskTracker {
    api: Arc<dyn RemoteApi>,
    policy: PollPolicy,
}

enum Pause {
    Elapsed,
    Cancelled,
}

impl TaskTracker {
    pub fn new(api: Arc<dyn RemoteApi>, policy: PollPolicy) -> Self {
        Self { api, policy }
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    pub async fn wait(&self, task_id: &TaskId) -> Result<Task, CloudError> {
        self.track(task_id, &self.policy, None).await
    }

    pub async fn wait_with(&self, task_id: &TaskId, policy: &PollPolicy) -> Result<Task, CloudError> {
        self.track(task_id, policy, None).await
    }

    /// [`wait`](Self::wait) と同じだが、`cancel` が `true` になった時点で `TaskTimeout` を返す。
    /// 送信側の drop はキャンセル扱いにしない。
    pub async fn wait_until_cancelled(
        &self,
        task_id: &TaskId,
        cancel: watch::Receiver<bool>,
    ) -> Result<Task, CloudError> {
        self.track(task_id, &self.policy, Some(cancel)).await
    }

    async fn track(
        &self,
        task_id: &TaskId,
        policy: &PollPolicy,
        mut cancel: Option<watch::Receiver<bool>>,
    ) -> Result<Task, CloudError> {
        let started = Instant::now();
        let mut failures: u32 = 0;
        let timeout = || CloudError::TaskTimeout {
            task_id: task_id.clone(),
        };

        if cancel.as_ref().is_some_and(|rx| *rx.borrow()) {
            return Err(timeout());
        }

        while started.elapsed() < policy.timeout {
            match self.api.get_task(task_id).await {
                Ok(task) => {
                    failures = 0;
                    match task.state {
                        TaskState::Completed => {
                            tracing::info!(task_id = %task_id, operation = %task.operation, "task completed");
                            return Ok(task);
                        }
                        TaskState::Error => {
                            tracing::error!(task_id = %task_id, operation = %task.operation, "task failed");
                            for err in task.step_errors() {
                                tracing::error!(task_id = %task_id, code = %err.code, "{}", err.message);
                            }
                            return Err(CloudError::task_failed(task));
                        }
                        ref state => {
                            tracing::debug!(task_id = %task_id, state = %state, "task in progress");
                        }
                    }
                }
                Err(err) if err.is_business() => return Err(err),
                Err(err) => {
                    failures += 1;
                    if failures > policy.max_retries {
                        tracing::error!(task_id = %task_id, failures, error = %err, "giving up on task");
                        return Err(err);
                    }
                    tracing::warn!(
                        task_id = %task_id,
                        failures,
                        max_retries = policy.max_retries,
                        error = %err,
                        "poll failed, retrying"
                    );
                }
            }

            if let Pause::Cancelled = pause(policy, &mut cancel).await {
                tracing::warn!(task_id = %task_id, "wait cancelled");
                return Err(timeout());
            }
        }

        tracing::error!(task_id = %task_id, timeout = ?policy.timeout, "timed out waiting for task");
        Err(timeout())
    }
}

/// ポーリング間隔 1 回分スリープ（キャンセルで早期に起きる）
async fn pause(policy: &PollPolicy, cancel: &mut Option<watch::Receiver<bool>>) -> Pause {
    let deadline = Instant::now() + policy.poll_interval;

    let Some(rx) = cancel.as_mut() else {
        sleep_until(deadline).await;
        return Pause::Elapsed;
    };

    let cancelled = tokio::select! {
        _ = sleep_until(deadline) => return Pause::Elapsed,
        res = rx.wait_for(|c| *c) => res.is_ok(),
    };

    if cancelled {
        return Pause::Cancelled;
    }

    // 送信側が drop 済み: もうキャンセルされることはない
    *cancel = None;
    sleep_until(deadline).await;
    Pause::Elapsed
}

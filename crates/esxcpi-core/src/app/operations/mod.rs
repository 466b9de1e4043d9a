//! Operations - リモート API 上の多段ライフサイクルパイプライン
//!
//! # 学習ポイント
//! - パイプラインは順序固定のステップ列。各ステップは変更を 1 つ投げ、返ってきた
//!   タスクを完了まで追跡する
//! - ステップの出力（作成されたエンティティ id）は次のステップの明示的な入力
//! - 最初に失敗したステップでパイプラインを打ち切り、そのエラーをそのまま返す
//! - ロールバックはしない（先行ステップで作ったものは残る）

mod agent_env;
mod disks;
mod stemcell;
mod vms;

pub use self::agent_env::IsoImage;
pub use self::disks::{DiskCloudProperties, disk_size_gb};
pub use self::vms::{VmCloudProperties, VmProvision};

use std::future::Future;
use std::sync::Arc;

use crate::app::TaskTracker;
use crate::config::{AgentConfig, CpiConfig};
use crate::domain::{CloudError, PollPolicy, Task};
use crate::impls::{HttpRemoteApi, SystemCommandRunner};
use crate::ports::{CommandRunner, NameGenerator, RemoteApi, SystemClock, UlidGenerator};

/// 1 回の呼び出しに必要なもの一式（1 回だけ組み立てて全アクションで共有）
pub struct Operations {
    api: Arc<dyn RemoteApi>,
    tracker: TaskTracker,
    runner: Arc<dyn CommandRunner>,
    names: Arc<dyn NameGenerator>,
    project: String,
    agent: AgentConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("missing {0}: set it on the builder before build()")]
    Missing(&'static str),

    #[error(transparent)]
    Client(#[from] CloudError),
}

impl Operations {
    pub fn builder() -> OperationsBuilder {
        OperationsBuilder::new()
    }

    /// 本番用の組み立て: HTTP クライアント、ホストの `mkisofs`、ULID の名前
    pub fn from_config(config: &CpiConfig) -> Result<Self, BuildError> {
        let api = HttpRemoteApi::from_config(&config.esxcloud)?;
        Self::builder()
            .remote(Arc::new(api))
            .project(config.esxcloud.project.clone())
            .agent(config.agent.clone())
            .policy(config.tasks.policy())
            .build()
    }

    pub fn tracker(&self) -> &TaskTracker {
        &self.tracker
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// 変更を 1 つ投げて、そのタスクを待つ
    async fn step<F>(&self, name: &'static str, submit: F) -> Result<Task, CloudError>
    where
        F: Future<Output = Result<Task, CloudError>> + Send,
    {
        let task = submit.await?;
        tracing::info!(step = name, task_id = %task.id, "submitted");
        let done = self.tracker.wait(&task.id).await?;
        tracing::info!(step = name, entity = %done.entity.id, "step done");
        Ok(done)
    }
}

/// Fail-fast なビルダー
///
/// - リモート API と project は必須
/// - それ以外は本番用のデフォルトがある
pub struct OperationsBuilder {
    api: Option<Arc<dyn RemoteApi>>,
    runner: Option<Arc<dyn CommandRunner>>,
    names: Option<Arc<dyn NameGenerator>>,
    project: Option<String>,
    agent: AgentConfig,
    policy: PollPolicy,
}

impl OperationsBuilder {
    pub fn new() -> Self {
        Self {
            api: None,
            runner: None,
            names: None,
            project: None,
            agent: AgentConfig::default(),
            policy: PollPolicy::default(),
        }
    }

    pub fn remote(mut self, api: Arc<dyn RemoteApi>) -> Self {
        self.api = Some(api);
        self
    }

    pub fn runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    pub fn names(mut self, names: Arc<dyn NameGenerator>) -> Self {
        self.names = Some(names);
        self
    }

    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn agent(mut self, agent: AgentConfig) -> Self {
        self.agent = agent;
        self
    }

    pub fn policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> Result<Operations, BuildError> {
        let api = self.api.ok_or(BuildError::Missing("remote API"))?;
        let project = self
            .project
            .filter(|p| !p.is_empty())
            .ok_or(BuildError::Missing("project"))?;

        Ok(Operations {
            tracker: TaskTracker::new(api.clone(), self.policy),
            api,
            runner: self.runner.unwrap_or_else(|| Arc::new(SystemCommandRunner)),
            names: self
                .names
                .unwrap_or_else(|| Arc::new(UlidGenerator::from_entropy(SystemClock))),
            project,
            agent: self.agent,
        })
    }
}

impl Default for OperationsBuilder {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::ScriptedRemoteApi;

    #[test]
    fn build_requires_remote_api() {
        let result = Operations::builder().project("p").build();
        assert!(matches!(result, Err(BuildError::Missing("remote API"))));
    }

    #[test]
    fn build_requires_non_empty_project() {
        let result = Operations::builder()
            .remote(Arc::new(ScriptedRemoteApi::new()))
            .project("")
            .build();
        assert!(matches!(result, Err(BuildError::Missing("project"))));
    }

    #[test]
    fn build_applies_policy() {
        let policy = testing::fast_policy();
        let ops = Operations::builder()
            .remote(Arc::new(ScriptedRemoteApi::new()))
            .project("p")
            .policy(policy.clone())
            .build()
            .unwrap();
        assert_eq!(ops.tracker().policy(), &policy);
        assert_eq!(ops.project(), "p");
    }
}

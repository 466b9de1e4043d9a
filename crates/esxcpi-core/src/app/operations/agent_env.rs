//! Agent env のパッケージング
//!
//! 記述子を `env` というファイル（ISO 9660 の 8.3 形式に収まる名前）に書き出し、
//! `mkisofs` で ISO イメージにする。どちらも 1 つの作業ディレクトリに置き、
//! [`IsoImage`] の drop で消える。

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use super::Operations;
use crate::domain::{ActionError, AgentEnv};

const MKISOFS: &str = "mkisofs";

/// パッケージ済み ISO イメージ（drop でファイルごと消える）
#[derive(Debug)]
pub struct IsoImage {
    path: PathBuf,
    _scratch: TempDir,
}

impl IsoImage {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Operations {
    pub async fn package_agent_env(&self, env: &AgentEnv) -> Result<IsoImage, ActionError> {
        let name = self.names.generate("agent-env");
        let scratch = tempfile::Builder::new().prefix(&name).tempdir()?;

        let env_dir = scratch.path().join("env-dir");
        tokio::fs::create_dir(&env_dir).await?;
        let env_file = env_dir.join("env");
        tokio::fs::write(&env_file, serde_json::to_vec(env)?).await?;

        let iso = scratch.path().join(format!("{name}.iso"));
        let args = vec![
            "-o".to_string(),
            iso.display().to_string(),
            env_file.display().to_string(),
        ];
        let output = self.runner.run(MKISOFS, &args).await?;
        if !output.success {
            return Err(ActionError::Command {
                program: MKISOFS.to_string(),
                output: format!("Failed to generate ISO for agent settings: {}", output.combined()),
            });
        }

        tracing::info!(vm = %env.vm.id, "packaged agent env");
        Ok(IsoImage {
            path: iso,
            _scratch: scratch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::operations::testing::operations;
    use crate::domain::{VmId, VmSpec};
    use crate::impls::{ScriptedRemoteApi, ScriptedRunner};
    use std::sync::Arc;

    fn env() -> AgentEnv {
        AgentEnv::new(
            "agent-1",
            VmSpec {
                name: "bosh-vm".into(),
                id: VmId::new("vm-1"),
            },
        )
    }

    #[tokio::test]
    async fn iso_is_removed_on_drop() {
        let runner = Arc::new(ScriptedRunner::new());
        let ops = operations(Arc::new(ScriptedRemoteApi::new()), runner.clone());

        let iso = ops.package_agent_env(&env()).await.unwrap();
        let path = iso.path().to_path_buf();
        assert!(path.exists());
        assert!(path.extension().is_some_and(|e| e == "iso"));

        let args = &runner.invocations()[0];
        assert_eq!(args[1], "-o");
        assert!(args[3].ends_with("env"));

        drop(iso);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn failed_command_reports_its_output() {
        let ops = operations(
            Arc::new(ScriptedRemoteApi::new()),
            Arc::new(ScriptedRunner::failing("bad option")),
        );

        let err = ops.package_agent_env(&env()).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "command 'mkisofs' failed: Failed to generate ISO for agent settings: bad option"
        );
    }
}

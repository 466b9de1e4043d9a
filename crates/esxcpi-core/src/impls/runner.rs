//! SystemCommandRunner - `tokio::process` による [`CommandRunner`] 実装

use async_trait::async_trait;
use tokio::process::Command;

use crate::ports::{CommandOutput, CommandRunner};

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, program: &str, args: &[String]) -> std::io::Result<CommandOutput> {
        tracing::debug!(program, ?args, "running command");
        let output = Command::new(program).args(args).output().await?;
        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

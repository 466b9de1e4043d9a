//! CommandRunner port - 外部プログラム（`mkisofs`）

use async_trait::async_trait;

/// 終了したコマンド 1 回分の結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// 両ストリーム（stdout が先）
    pub fn combined(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (true, _) => self.stderr.clone(),
            (false, true) => self.stdout.clone(),
            (false, false) => format!("{}\n{}", self.stdout, self.stderr),
        }
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// `program` を最後まで実行。`Err` は起動自体できなかったことを表す
    async fn run(&self, program: &str, args: &[String]) -> std::io::Result<CommandOutput>;
}

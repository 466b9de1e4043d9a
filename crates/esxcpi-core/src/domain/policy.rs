//! PollPolicy - リモートタスクをどれだけ、どの間隔で待つか

use std::time::Duration;

/// タスク追跡のポーリング方針
///
/// # リトライ予算
/// - *連続した* ポーリング失敗を数える
/// - ポーリングが成功するたびに 0 に戻る
/// - `timeout` を延ばすことはない
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    /// ポーリング間隔（失敗したポーリングとそのリトライの間も同じ）
    pub poll_interval: Duration,

    /// 諦めるまでに許容する連続した一時的失敗の回数
    pub max_retries: u32,

    /// 待機全体の時間予算
    pub timeout: Duration,
}

impl PollPolicy {
    pub fn new(poll_interval: Duration, max_retries: u32, timeout: Duration) -> Self {
        Self {
            poll_interval,
            max_retries,
            timeout,
        }
    }
}

impl Default for PollPolicy {
    /// ポーリング間隔 100ms、連続リトライ 3 回、全体 30 分
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            max_retries: 3,
            timeout: Duration::from_secs(30 * 60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_has_sdk_values() {
        let policy = PollPolicy::default();
        assert_eq!(policy.poll_interval, Duration::from_millis(100));
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.timeout, Duration::from_secs(1800));
    }
}

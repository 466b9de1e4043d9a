//! App - ports を組み合わせたアプリケーション層
//!
//! # 主要コンポーネント
//! - **TaskTracker**: リモートタスクが終端状態になるまでポーリング
//! - **Operations**: VM / ディスク / ステムセルの多段パイプライン
//! - **ActionTable**: `Operations` 上の名前付きアクション
//! - **Dispatcher**: リクエスト 1 件 → `{result, error, log}` 1 件
//! - **LogTrail**: 呼び出し単位のログ収集（エンベロープの `log`）

pub mod actions;
pub mod dispatch;
pub mod operations;
pub mod trail;
pub mod tracker;

pub use self::actions::{Action, ActionTable, Args, RegistryError};
pub use self::dispatch::{Dispatcher, SevereFault, response_error};
pub use self::operations::{BuildError, Operations, OperationsBuilder};
pub use self::trail::LogTrail;
pub use self::tracker::TaskTracker;

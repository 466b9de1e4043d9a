//! Ports - パイプラインがプロセス外とやり取りするための trait 群
//!
//! リモート API、外部コマンド、時刻、名前生成はすべて注入する。
//! テストはグローバル状態に触れずにフェイクへ差し替えられる。

pub mod clock;
pub mod id_generator;
pub mod remote;
pub mod runner;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{NameGenerator, UlidGenerator};
pub use self::remote::RemoteApi;
pub use self::runner::{CommandOutput, CommandRunner};

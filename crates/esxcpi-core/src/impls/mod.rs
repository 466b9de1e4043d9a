//! Impls - ports の実装
//!
//! - **HttpRemoteApi**: HTTP 越しのリモート API
//! - **SystemCommandRunner**: `tokio::process` による外部コマンド
//! - **ScriptedRemoteApi** / **ScriptedRunner**: テスト用の台本付きフェイク

pub mod classify;
pub mod http;
pub mod runner;
pub mod scripted;

pub use self::classify::classify;
pub use self::http::HttpRemoteApi;
pub use self::runner::SystemCommandRunner;
pub use self::scripted::{RecordedCall, ScriptedRemoteApi, ScriptedRunner};

//! esxcpi-core
//!
//! esxcloud 向け BOSH CPI の構成要素。
//!
//! # モジュール構成
//! - **domain**: ID、タスク、リソース、エラー、リクエスト/レスポンスのエンベロープ
//! - **ports**: 外部との境界（RemoteApi, CommandRunner, Clock, NameGenerator）
//! - **impls**: HTTP クライアント、エラー分類、プロセス実行、台本付きフェイク
//! - **app**: タスクトラッカー、パイプライン、アクションテーブル、Dispatcher
//! - **config**: JSON 設定ファイル

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;

pub use app::{ActionTable, Dispatcher, Operations};
pub use config::CpiConfig;
pub use domain::{ActionError, CloudError, Request, Response};

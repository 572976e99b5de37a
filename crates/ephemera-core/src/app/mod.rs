//! App - アプリケーション層
//!
//! store と ports を組み合わせて、外から使う形にまとめます。
//!
//! # 主要コンポーネント
//! - **AppBuilder**: 設定の検証とワイヤリング
//! - **ArtifactService**: リクエスト層向けの操作（一覧・rename・削除・全削除・ダウンロード）
//! - **ExpiryScheduler**: TTL 切れセッションの purge ループ

pub mod builder;
pub mod expiry_loop;
pub mod service;

pub use self::builder::{App, AppBuilder, BuildError};
pub use self::expiry_loop::{ExpiryHandle, ExpiryScheduler, TickReport};
pub use self::service::{ArtifactService, Download};

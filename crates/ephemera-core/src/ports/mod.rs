//! Ports - 抽象化レイヤー
//!
//! 時刻・ID 生成・バイト列の保存先を trait として切り出します。
//! store 層はこれらの trait だけに依存し、実装（impls）は AppBuilder が選びます。
//!
//! # 設計原則
//! - 期限の判定はすべて Clock 経由（テストでは FixedClock で時間を進める）
//! - Blob storage はバイト列だけを持ち、メタ情報は ArtifactStore が正本

pub mod blob_store;
pub mod clock;
pub mod id_generator;

pub use self::blob_store::BlobStore;
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};

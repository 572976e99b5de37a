//! ephemera-core
//!
//! Ephemeral artifact store: 処理結果のファイルをセッション単位で一時保持し、
//! TTL が切れたら消します。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, names, artifact, session, state, errors, reports）
//! - **ports**: 抽象化レイヤー（Clock, BlobStore, IdGenerator）
//! - **impls**: 実装（InMemoryBlobStore, LocalBlobStore）
//! - **store**: ArtifactStore, RenameService, CleanupCoordinator
//! - **app**: AppBuilder, ArtifactService, ExpiryScheduler
//! - **config**: StoreConfig（JSON）

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod store;

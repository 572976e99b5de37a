//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryBlobStore**: 既定の Blob ストア（プロセス内メモリ）
//! - **LocalBlobStore**: ローカルディスク上の Blob ストア

pub mod inmem_blob;
pub mod local_blob;

pub use self::inmem_blob::InMemoryBlobStore;
pub use self::local_blob::LocalBlobStore;

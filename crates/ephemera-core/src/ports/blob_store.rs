//! BlobStore port - artifact のバイト列の保存先
//!
//! - **InMemoryBlobStore**: 開発・テスト用
//! - **LocalBlobStore**: ローカルファイルシステム
//!
//! # 設計原則
//! - オブジェクトのキーは (session, internal_name) のみ。display_name は使わない
//! - `remove` は冪等（既に無ければ 0 を返して成功）
//! - メタ情報の管理は ArtifactStore 側。BlobStore はバイト列だけを扱う

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::{InternalName, SessionId, StorageError};

/// BlobStore は artifact のバイト列を保持
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// バイト列を保存し、保存したサイズを返す
    async fn put(
        &self,
        session: SessionId,
        internal_name: &InternalName,
        bytes: Bytes,
    ) -> Result<u64, StorageError>;

    /// バイト列を読む（ダウンロード用）
    async fn get(&self, session: SessionId, internal_name: &InternalName)
    -> Result<Bytes, StorageError>;

    /// 1 件解放し、解放したバイト数を返す。存在しなければ 0。
    async fn remove(
        &self,
        session: SessionId,
        internal_name: &InternalName,
    ) -> Result<u64, StorageError>;

    /// セッション配下をすべて解放し、解放したバイト数を返す。存在しなければ 0。
    async fn remove_session(&self, session: SessionId) -> Result<u64, StorageError>;
}

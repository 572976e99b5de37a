//! InMemoryBlobStore - 開発用の Blob ストア
//!
//! # 実装詳細
//! - DashMap<SessionId, HashMap<InternalName, Bytes>> でセッションごとに管理
//! - シャード単位のロックなので、別セッションの操作は互いに待たない
//! - ロックは await をまたがない

use std::collections::HashMap;
#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

use crate::domain::{InternalName, SessionId, StorageError};
use crate::ports::BlobStore;

/// InMemoryBlobStore はプロセス内メモリにバイト列を保持
#[derive(Default)]
pub struct InMemoryBlobStore {
    sessions: DashMap<SessionId, HashMap<InternalName, Bytes>>,
    #[cfg(test)]
    fail_removals: AtomicBool,
    #[cfg(test)]
    fail_puts: AtomicBool,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 保持しているバイト数の合計
    pub fn total_bytes(&self) -> u64 {
        self.sessions
            .iter()
            .map(|entry| entry.value().values().map(|b| b.len() as u64).sum::<u64>())
            .sum()
    }

    pub fn contains(&self, session: SessionId, internal_name: &InternalName) -> bool {
        self.sessions
            .get(&session)
            .is_some_and(|blobs| blobs.contains_key(internal_name))
    }

    /// テスト用: 以降の remove / remove_session を失敗させる
    #[cfg(test)]
    pub(crate) fn set_fail_removals(&self, fail: bool) {
        self.fail_removals.store(fail, Ordering::SeqCst);
    }

    /// テスト用: 以降の put を失敗させる
    #[cfg(test)]
    pub(crate) fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    #[cfg(test)]
    fn check_removal(&self) -> Result<(), StorageError> {
        if self.fail_removals.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("injected removal failure".to_string()));
        }
        Ok(())
    }

    #[cfg(not(test))]
    fn check_removal(&self) -> Result<(), StorageError> {
        Ok(())
    }

    #[cfg(test)]
    fn check_put(&self) -> Result<(), StorageError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("injected write failure".to_string()));
        }
        Ok(())
    }

    #[cfg(not(test))]
    fn check_put(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(
        &self,
        session: SessionId,
        internal_name: &InternalName,
        bytes: Bytes,
    ) -> Result<u64, StorageError> {
        self.check_put()?;
        let size = bytes.len() as u64;
        self.sessions
            .entry(session)
            .or_default()
            .insert(internal_name.clone(), bytes);
        Ok(size)
    }

    async fn get(
        &self,
        session: SessionId,
        internal_name: &InternalName,
    ) -> Result<Bytes, StorageError> {
        self.sessions
            .get(&session)
            .and_then(|blobs| blobs.get(internal_name).cloned())
            .ok_or_else(|| StorageError::Missing(internal_name.clone()))
    }

    async fn remove(
        &self,
        session: SessionId,
        internal_name: &InternalName,
    ) -> Result<u64, StorageError> {
        self.check_removal()?;
        let freed = self
            .sessions
            .get_mut(&session)
            .and_then(|mut blobs| blobs.remove(internal_name))
            .map(|b| b.len() as u64)
            .unwrap_or(0);
        Ok(freed)
    }

    async fn remove_session(&self, session: SessionId) -> Result<u64, StorageError> {
        self.check_removal()?;
        let freed = self
            .sessions
            .remove(&session)
            .map(|(_, blobs)| blobs.values().map(|b| b.len() as u64).sum())
            .unwrap_or(0);
        Ok(freed)
    }
}

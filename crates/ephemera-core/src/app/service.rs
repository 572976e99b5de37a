//! ArtifactService - リクエスト層に見せる操作
//!
//! 処理ツール（artifact を作る側）と画面（一覧・rename・削除・ダウンロード）の
//! 両方がこの型だけを使います。エラーは StoreError のまま返し、
//! HTTP などへの変換は呼び出し側の責務です。

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::domain::{
    ArtifactView, Countdown, DeleteReport, InternalName, NewArtifact, PurgeReport, RenameReport,
    SessionId, SessionStats, StoreError,
};
use crate::store::{ArtifactStore, CleanupCoordinator};

/// ダウンロード応答に必要なもの
#[derive(Debug, Clone)]
pub struct Download {
    pub display_name: String,
    pub bytes: Bytes,
}

#[derive(Clone)]
pub struct ArtifactService {
    store: Arc<ArtifactStore>,
    cleanup: CleanupCoordinator,
}

impl ArtifactService {
    pub fn new(store: Arc<ArtifactStore>, cleanup: CleanupCoordinator) -> Self {
        Self { store, cleanup }
    }

    /// 処理の 1 バッチぶんのセッションを開始。期限はここで固定される
    pub fn start_session(&self) -> SessionId {
        self.store.open_session()
    }

    pub async fn add_artifact(
        &self,
        session: SessionId,
        meta: NewArtifact,
        bytes: Bytes,
    ) -> Result<ArtifactView, StoreError> {
        let internal_name = self.store.create(session, meta, bytes).await?;
        let artifact = self.store.get(session, &internal_name).await?;
        Ok(artifact.view(session))
    }

    /// 全削除。何度呼んでも成功し、2 回目以降はゼロ件
    pub async fn purge_session(&self, session: SessionId) -> Result<PurgeReport, StoreError> {
        self.cleanup.bulk_delete(session).await
    }

    pub async fn delete_artifact(
        &self,
        session: SessionId,
        internal_name: &InternalName,
    ) -> Result<DeleteReport, StoreError> {
        self.cleanup.single_delete(session, internal_name).await
    }

    pub async fn rename_artifact(
        &self,
        session: SessionId,
        internal_name: &InternalName,
        new_name: &str,
    ) -> Result<RenameReport, StoreError> {
        self.store.rename(session, internal_name, new_name).await
    }

    pub async fn list_artifacts(&self, session: SessionId) -> Vec<ArtifactView> {
        self.store
            .list(session)
            .await
            .iter()
            .map(|a| a.view(session))
            .collect()
    }

    pub async fn deadline(&self, session: SessionId) -> Result<DateTime<Utc>, StoreError> {
        self.store.deadline(session).await
    }

    pub async fn countdown(&self, session: SessionId) -> Result<Countdown, StoreError> {
        self.store.countdown(session).await
    }

    pub async fn download(
        &self,
        session: SessionId,
        internal_name: &InternalName,
    ) -> Result<Download, StoreError> {
        let (artifact, bytes) = self.store.read(session, internal_name).await?;
        Ok(Download {
            display_name: artifact.display_name,
            bytes,
        })
    }

    /// セッションの active な artifact を display_name で zip にまとめる
    pub async fn download_zip(&self, session: SessionId) -> Result<Download, StoreError> {
        let archive = self.store.archive(session).await?;
        Ok(Download {
            display_name: archive.file_name,
            bytes: archive.bytes,
        })
    }

    pub async fn session_stats(&self, session: SessionId) -> SessionStats {
        self.store.stats(session).await
    }
}

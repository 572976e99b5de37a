//! CleanupCoordinator - 削除経路の一本化
//!
//! ユーザー操作（全削除・単体削除）とスケジューラの purge は、すべてここを通ります。
//! どの経路も冪等で、「既に無い」は成功（ゼロ件）として返します。

use std::sync::Arc;

use crate::domain::{DeleteReport, InternalName, PurgeReport, SessionId, StoreError};
use crate::store::ArtifactStore;

#[derive(Clone)]
pub struct CleanupCoordinator {
    store: Arc<ArtifactStore>,
}

impl CleanupCoordinator {
    pub fn new(store: Arc<ArtifactStore>) -> Self {
        Self { store }
    }

    /// Purge every artifact in the session.
    ///
    /// A repeat call (or a call racing the scheduler) reports zero; only the
    /// first purge frees bytes.
    pub async fn bulk_delete(&self, session: SessionId) -> Result<PurgeReport, StoreError> {
        let report = self.store.purge_all(session).await?;
        if report.is_noop() {
            tracing::debug!(session = %session, "bulk delete found nothing to free");
        } else {
            tracing::info!(
                session = %session,
                deleted_count = report.deleted_count,
                freed_bytes = report.freed_bytes,
                "session cleaned up"
            );
        }
        Ok(report)
    }

    /// Delete a single artifact; `deleted == false` when it was already gone.
    pub async fn single_delete(
        &self,
        session: SessionId,
        internal_name: &InternalName,
    ) -> Result<DeleteReport, StoreError> {
        // 0 バイトの artifact もあるので freed_bytes ではなく take の結果で判定する
        let report = match self.store.take(session, internal_name).await? {
            Some(artifact) => {
                tracing::info!(
                    session = %session,
                    internal_name = %internal_name,
                    freed_bytes = artifact.size_bytes,
                    "artifact deleted"
                );
                DeleteReport {
                    deleted: true,
                    freed_bytes: artifact.size_bytes,
                }
            }
            None => DeleteReport::default(),
        };
        Ok(report)
    }
}

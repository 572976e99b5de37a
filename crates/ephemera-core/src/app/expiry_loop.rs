//! ExpiryLoop - TTL 切れセッションの purge
//!
//! # フロー（tick ごと）
//! 1. ArtifactStore::due_sessions(now) で期限切れかつ未 purge のセッションを取得
//! 2. CleanupCoordinator::bulk_delete で purge（ユーザー操作と同じ経路）
//! 3. 保持期間を過ぎた tombstone を捨てる
//!
//! 期限切れの判定は Clock の時刻だけで行うので、tick が遅れても
//! 読み取り側は deadline 時点で空に見えます（ArtifactStore の closed 判定）。
//! purge が StorageError で失敗したセッションは次の tick でもう一度 due になります。

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::domain::{PurgeReport, SessionId};
use crate::ports::Clock;
use crate::store::{ArtifactStore, CleanupCoordinator};

/// 1 回の tick の結果
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// purge に成功したセッション（この tick で Expired 終端に到達）
    pub expired: Vec<(SessionId, PurgeReport)>,
    /// purge に失敗したセッション（次の tick で再試行）
    pub failed: Vec<SessionId>,
    /// 捨てた tombstone の数
    pub evicted: usize,
}

impl TickReport {
    pub fn is_idle(&self) -> bool {
        self.expired.is_empty() && self.failed.is_empty() && self.evicted == 0
    }
}

pub struct ExpiryScheduler {
    store: Arc<ArtifactStore>,
    cleanup: CleanupCoordinator,
    clock: Arc<dyn Clock>,
    tick_interval: Duration,
    tombstone_retention: chrono::Duration,
}

impl ExpiryScheduler {
    pub fn new(
        store: Arc<ArtifactStore>,
        cleanup: CleanupCoordinator,
        clock: Arc<dyn Clock>,
        tick_interval: Duration,
        tombstone_retention: chrono::Duration,
    ) -> Self {
        Self {
            store,
            cleanup,
            clock,
            tick_interval,
            tombstone_retention,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// 期限切れセッションを 1 回ぶん処理する
    pub async fn tick(&self) -> TickReport {
        let now = self.clock.now();
        let mut report = TickReport::default();

        for session in self.store.due_sessions(now).await {
            match self.cleanup.bulk_delete(session).await {
                Ok(purge) => {
                    tracing::info!(
                        session = %session,
                        deleted_count = purge.deleted_count,
                        freed_bytes = purge.freed_bytes,
                        "session expired"
                    );
                    report.expired.push((session, purge));
                }
                Err(e) => {
                    tracing::warn!(session = %session, error = %e, "expiry purge failed, will retry");
                    report.failed.push(session);
                }
            }
        }

        let cutoff = now
            .checked_sub_signed(self.tombstone_retention)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        report.evicted = self.store.evict_tombstones(cutoff).await;
        report
    }

    /// cancel されるまで tick を繰り返す
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tracing::info!(tick_ms = self.tick_interval.as_millis() as u64, "expiry scheduler started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    let report = self.tick().await;
                    if !report.is_idle() {
                        tracing::debug!(
                            expired = report.expired.len(),
                            failed = report.failed.len(),
                            evicted = report.evicted,
                            "expiry tick"
                        );
                    }
                }
            }
        }
        tracing::info!("expiry scheduler stopped");
    }

    /// バックグラウンドで run を起動
    pub fn spawn(self: Arc<Self>) -> ExpiryHandle {
        let shutdown = CancellationToken::new();
        let join = tokio::spawn(self.run(shutdown.clone()));
        ExpiryHandle { shutdown, join }
    }
}

/// Scheduler task handle.
/// - `request_shutdown()` で次の tick を待たずに止まる（実行中の purge は最後まで走る）
/// - `shutdown_and_join()` で終了を待てる
pub struct ExpiryHandle {
    shutdown: CancellationToken,
    join: JoinHandle<()>,
}

impl ExpiryHandle {
    pub fn request_shutdown(&self) {
        self.shutdown.cancel();
    }

    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        if let Err(e) = self.join.await {
            tracing::warn!(error = %e, "expiry scheduler task ended abnormally");
        }
    }
}

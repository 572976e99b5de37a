//! AppBuilder - アプリケーションの構築とワイヤリング
//!
//! # 起動時検証（Fail-fast 設計）
//! - build() で StoreConfig::validate() を通す（TTL 0 や範囲外の値はここで止める）
//! - Local storage の root が作れなければ build() が失敗する

use std::sync::Arc;

use crate::app::{ArtifactService, ExpiryHandle, ExpiryScheduler};
use crate::config::{ConfigError, StorageConfig, StoreConfig};
use crate::domain::StorageError;
use crate::impls::{InMemoryBlobStore, LocalBlobStore};
use crate::ports::{BlobStore, Clock, IdGenerator, SystemClock, UlidGenerator};
use crate::store::{ArtifactStore, CleanupCoordinator, RenameService};

/// AppBuilder はアプリケーションを構築
///
/// # 使用例
/// ```ignore
/// let app = AppBuilder::new()
///     .config(StoreConfig::from_json_file("ephemera.json")?)
///     .build()
///     .await?;
/// let scheduler = app.spawn_scheduler();
/// ```
///
/// clock / blob_store / id_generator を指定しなければ
/// SystemClock と config.storage に従った BlobStore を使います。
#[derive(Default)]
pub struct AppBuilder {
    config: StoreConfig,
    clock: Option<Arc<dyn Clock>>,
    blobs: Option<Arc<dyn BlobStore>>,
    ids: Option<Arc<dyn IdGenerator>>,
}

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to open blob storage: {0}")]
    Storage(#[from] StorageError),
}

impl AppBuilder {
    /// 新しい AppBuilder を作成（既定の StoreConfig）
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// テストでは FixedClock を渡す
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// config.storage を無視して、この BlobStore を使う
    pub fn blob_store(mut self, blobs: Arc<dyn BlobStore>) -> Self {
        self.blobs = Some(blobs);
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// 設定を検証して App を組み立てる
    pub async fn build(self) -> Result<App, BuildError> {
        self.config.validate()?;
        let ttl = self.config.ttl()?;
        let tombstone_retention = self.config.tombstone_retention()?;

        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock),
        };
        let blobs: Arc<dyn BlobStore> = match (self.blobs, &self.config.storage) {
            (Some(blobs), _) => blobs,
            (None, StorageConfig::Memory) => Arc::new(InMemoryBlobStore::new()),
            (None, StorageConfig::Local { root }) => Arc::new(LocalBlobStore::open(root).await?),
        };
        let ids: Arc<dyn IdGenerator> = match self.ids {
            Some(ids) => ids,
            None => Arc::new(UlidGenerator::new(Arc::clone(&clock))),
        };

        let store = Arc::new(ArtifactStore::new(
            blobs,
            Arc::clone(&clock),
            ids,
            RenameService::new(self.config.max_name_bytes),
            ttl,
        ));
        let cleanup = CleanupCoordinator::new(Arc::clone(&store));
        let service = ArtifactService::new(Arc::clone(&store), cleanup.clone());
        let scheduler = Arc::new(ExpiryScheduler::new(
            Arc::clone(&store),
            cleanup.clone(),
            clock,
            self.config.tick_interval(),
            tombstone_retention,
        ));

        tracing::info!(
            ttl_secs = self.config.ttl_secs,
            storage = ?self.config.storage,
            "artifact store ready"
        );

        Ok(App {
            config: self.config,
            store,
            cleanup,
            service,
            scheduler,
        })
    }
}

/// App は組み立て済みのコンポーネント一式
pub struct App {
    pub config: StoreConfig,
    pub store: Arc<ArtifactStore>,
    pub cleanup: CleanupCoordinator,
    pub service: ArtifactService,
    pub scheduler: Arc<ExpiryScheduler>,
}

impl App {
    /// ExpiryScheduler をバックグラウンドで起動
    pub fn spawn_scheduler(&self) -> ExpiryHandle {
        Arc::clone(&self.scheduler).spawn()
    }
}

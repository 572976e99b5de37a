//! LocalBlobStore - ローカルファイルシステム上の Blob ストア
//!
//! レイアウト: `<root>/sess_<ulid>/<internal_name>`
//!
//! パスは SessionId と InternalName だけから組み立てます。
//! InternalName は検証済み（区切り文字なし・先頭ドットなし）なので root の外には出ません。
//!
//! セッション登録簿はメモリにしか無いので、open 時点で root 直下にある
//! `sess_*` フォルダはすべて前のプロセスの残骸です。open がまとめて消します。

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;

use crate::domain::{InternalName, SessionId, StorageError};
use crate::domain::ids::{IdMarker, Session};
use crate::ports::BlobStore;

/// LocalBlobStore はディレクトリ配下にファイルとして保存
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// root を作成し、前回起動時の `sess_*` フォルダを掃除して LocalBlobStore を返す
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| StorageError::io(&root, e))?;
        let store = Self { root };
        let swept = store.sweep_orphans().await?;
        if swept > 0 {
            tracing::info!(root = %store.root.display(), swept, "removed leftover session folders");
        }
        Ok(store)
    }

    /// root 直下の `sess_<ulid>` フォルダを削除し、削除した数を返す
    ///
    /// それ以外のファイル・フォルダには触らない。
    pub async fn sweep_orphans(&self) -> Result<usize, StorageError> {
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| StorageError::io(&self.root, e))?;
        let mut swept = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::io(&self.root, e))?
        {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if !name.starts_with(Session::prefix()) || name.parse::<SessionId>().is_err() {
                continue;
            }
            let path = entry.path();
            let is_dir = entry
                .file_type()
                .await
                .map_err(|e| StorageError::io(&path, e))?
                .is_dir();
            if !is_dir {
                continue;
            }
            match fs::remove_dir_all(&path).await {
                Ok(()) => swept += 1,
                Err(e) if e.kind() == IoErrorKind::NotFound => {}
                Err(e) => return Err(StorageError::io(&path, e)),
            }
        }
        Ok(swept)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn session_dir(&self, session: SessionId) -> PathBuf {
        self.root.join(session.to_string())
    }

    pub fn object_path(&self, session: SessionId, internal_name: &InternalName) -> PathBuf {
        self.session_dir(session).join(internal_name.as_str())
    }
}

/// 書き込みに失敗したファイルの残骸を消す（無ければ何もしない）
async fn discard_partial(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "partial blob removed"),
        Err(e) if e.kind() == IoErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove partial blob"),
    }
}

/// ディレクトリ配下のファイルサイズ合計（存在しなければ 0）
async fn dir_size(dir: &Path) -> Result<u64, StorageError> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(StorageError::io(dir, e)),
    };
    let mut total = 0;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| StorageError::io(dir, e))?
    {
        let meta = entry
            .metadata()
            .await
            .map_err(|e| StorageError::io(entry.path(), e))?;
        if meta.is_file() {
            total += meta.len();
        }
    }
    Ok(total)
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(
        &self,
        session: SessionId,
        internal_name: &InternalName,
        bytes: Bytes,
    ) -> Result<u64, StorageError> {
        let dir = self.session_dir(session);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StorageError::io(&dir, e))?;
        let path = dir.join(internal_name.as_str());
        let size = bytes.len() as u64;
        if let Err(e) = fs::write(&path, &bytes).await {
            discard_partial(&path).await;
            return Err(StorageError::io(&path, e));
        }
        tracing::debug!(path = %path.display(), size, "blob written");
        Ok(size)
    }

    async fn get(
        &self,
        session: SessionId,
        internal_name: &InternalName,
    ) -> Result<Bytes, StorageError> {
        let path = self.object_path(session, internal_name);
        match fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                Err(StorageError::Missing(internal_name.clone()))
            }
            Err(e) => Err(StorageError::io(&path, e)),
        }
    }

    async fn remove(
        &self,
        session: SessionId,
        internal_name: &InternalName,
    ) -> Result<u64, StorageError> {
        let path = self.object_path(session, internal_name);
        let size = match fs::metadata(&path).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(StorageError::io(&path, e)),
        };
        match fs::remove_file(&path).await {
            Ok(()) => Ok(size),
            // 別タスクが先に消した
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(0),
            Err(e) => Err(StorageError::io(&path, e)),
        }
    }

    async fn remove_session(&self, session: SessionId) -> Result<u64, StorageError> {
        let dir = self.session_dir(session);
        let size = dir_size(&dir).await?;
        match fs::remove_dir_all(&dir).await {
            Ok(()) => {
                tracing::debug!(dir = %dir.display(), freed_bytes = size, "session folder removed");
                Ok(size)
            }
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(0),
            Err(e) => Err(StorageError::io(&dir, e)),
        }
    }
}

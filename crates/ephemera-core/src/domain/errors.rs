//! Errors - エラー型と分類
//!
//! - **NameError**: 新しい表示名が不正（ValidationError）
//! - **StorageError**: Blob の読み書き・解放に失敗（再試行可能）
//! - **StoreError**: ArtifactStore の操作エラー全体
//!
//! 削除系（delete / purge）は「既に無い」をエラーにしません。

use std::path::PathBuf;

use thiserror::Error;

use super::ids::SessionId;
use super::names::InternalName;

/// ErrorKind は実行エラーの分類
///
/// - Transient: 一時的なエラー（リトライ推奨）
/// - Permanent: 恒久的なエラー（リトライ無意味）
/// - Infrastructure: インフラエラー（Blob ストレージの障害）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    Permanent,
    Infrastructure,
}

/// NameError は表示名の検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("display name is empty")]
    Empty,

    #[error("display name contains forbidden character {0:?}")]
    ForbiddenCharacter(char),

    #[error("display name '{0}' is reserved")]
    Reserved(String),

    #[error("display name is {len} bytes, limit is {max}")]
    TooLong { len: usize, max: usize },
}

/// StorageError は Blob ストレージの障害
///
/// 単一操作にとっては致命的だが、セッションのメタ情報は壊さない。
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("blob missing for {0}")]
    Missing(InternalName),

    #[error("{0}")]
    Backend(String),

    #[error("failed to build archive: {0}")]
    Archive(#[from] zip::result::ZipError),
}

impl StorageError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// 同じ操作をすぐやり直せば通りそうな I/O エラー
    pub fn is_transient(&self) -> bool {
        match self {
            StorageError::Io { source, .. } => matches!(
                source.kind(),
                std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }
}

/// StoreError はストア操作のエラー
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid display name: {0}")]
    Validation(#[from] NameError),

    #[error("display name '{name}' is already used by {holder}")]
    NameCollision { name: String, holder: InternalName },

    #[error("artifact {internal_name} not found in {session}")]
    NotFound {
        session: SessionId,
        internal_name: InternalName,
    },

    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    #[error("session {0} is closed")]
    SessionClosed(SessionId),

    #[error("session {0} has no artifacts to archive")]
    NothingToArchive(SessionId),

    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Storage(e) if e.is_transient() => ErrorKind::Transient,
            StoreError::Storage(_) => ErrorKind::Infrastructure,
            StoreError::Validation(_)
            | StoreError::NameCollision { .. }
            | StoreError::NotFound { .. }
            | StoreError::SessionNotFound(_)
            | StoreError::SessionClosed(_)
            | StoreError::NothingToArchive(_) => ErrorKind::Permanent,
        }
    }

    /// Retrying the same request can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Transient | ErrorKind::Infrastructure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use ulid::Ulid;

    #[test]
    fn storage_errors_are_retryable() {
        let err = StoreError::from(StorageError::Backend("disk full".to_string()));
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
        assert!(err.is_retryable());
    }

    #[rstest]
    #[case::interrupted(std::io::ErrorKind::Interrupted, ErrorKind::Transient)]
    #[case::timed_out(std::io::ErrorKind::TimedOut, ErrorKind::Transient)]
    #[case::would_block(std::io::ErrorKind::WouldBlock, ErrorKind::Transient)]
    #[case::permission(std::io::ErrorKind::PermissionDenied, ErrorKind::Infrastructure)]
    #[case::storage_full(std::io::ErrorKind::Other, ErrorKind::Infrastructure)]
    fn io_errors_are_classified(#[case] io: std::io::ErrorKind, #[case] expected: ErrorKind) {
        let err = StoreError::from(StorageError::io(
            "/tmp/processed/sess_x/a.pdf",
            std::io::Error::from(io),
        ));
        assert_eq!(err.kind(), expected);
        assert!(err.is_retryable());
    }

    #[test]
    fn caller_errors_are_permanent() {
        let session = SessionId::from_ulid(Ulid::new());
        let errors = [
            StoreError::from(NameError::Empty),
            StoreError::NameCollision {
                name: "a.pdf".to_string(),
                holder: InternalName::parse("a.pdf").unwrap(),
            },
            StoreError::SessionNotFound(session),
            StoreError::SessionClosed(session),
            StoreError::NothingToArchive(session),
        ];
        for err in errors {
            assert_eq!(err.kind(), ErrorKind::Permanent);
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn messages_name_the_offender() {
        let err = StoreError::NameCollision {
            name: "final.pdf".to_string(),
            holder: InternalName::parse("merge_1_2.pdf").unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "display name 'final.pdf' is already used by merge_1_2.pdf"
        );

        let err = StoreError::from(NameError::TooLong { len: 300, max: 255 });
        assert_eq!(
            err.to_string(),
            "invalid display name: display name is 300 bytes, limit is 255"
        );
    }
}

//! Store - セッションと artifact のメタ情報
//!
//! - **ArtifactStore**: セッション登録簿 + セッション単位のロック
//! - **RenameService**: 表示名の検証（ArtifactStore がロック内で呼ぶ）
//! - **CleanupCoordinator**: 冪等な単体削除・全削除
//! - **archive**: セッション一括ダウンロード用の zip

pub mod archive;
pub mod artifact_store;
pub mod cleanup;
pub mod rename;

pub use self::archive::SessionArchive;
pub use self::artifact_store::ArtifactStore;
pub use self::cleanup::CleanupCoordinator;
pub use self::rename::RenameService;

//! Domain model (ids, names, artifacts, sessions, errors, reports).
//!
//! このモジュールは I/O を持ちません。ロックや Blob の解放は store 層の責務で、
//! ここでは不変条件（表示名の一意性、purge の終端性）だけを守ります。

pub mod artifact;
pub mod errors;
pub mod ids;
pub mod names;
pub mod reports;
pub mod session;
pub mod state;

pub use artifact::{Artifact, ArtifactState, ArtifactView, NewArtifact};
pub use errors::{ErrorKind, NameError, StorageError, StoreError};
pub use ids::{IdParseError, SessionId};
pub use names::{DownloadRef, InternalName, InternalNameError};
pub use reports::{Countdown, DeleteReport, PurgeReport, RenameReport, SessionStats};
pub use session::Session;
pub use state::ExpiryPhase;

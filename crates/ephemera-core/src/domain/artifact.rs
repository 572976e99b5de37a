//! Artifact record: one processed output file and its metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::SessionId;
use super::names::{DownloadRef, InternalName};

/// Artifact state.
///
/// State transitions:
/// - Active -> Deleted (single delete or session purge)
///
/// Deleted is terminal; there is no reactivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtifactState {
    Active,
    Deleted,
}

impl ArtifactState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ArtifactState::Deleted)
    }
}

/// Metadata supplied by the producing tool when it registers an output.
///
/// `display_name` is assumed pre-sanitized by the tool; its extension decides
/// the extension of the generated internal name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewArtifact {
    pub display_name: String,
    pub tool_id: String,
    pub tool_name: String,
    pub processed_time: DateTime<Utc>,
}

impl NewArtifact {
    pub fn new(
        display_name: impl Into<String>,
        tool_id: impl Into<String>,
        tool_name: impl Into<String>,
        processed_time: DateTime<Utc>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            tool_id: tool_id.into(),
            tool_name: tool_name.into(),
            processed_time,
        }
    }
}

/// Artifact record.
///
/// Only `display_name` and `state` change after creation, and only through
/// the session that owns the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub internal_name: InternalName,
    pub display_name: String,
    pub size_bytes: u64,
    pub processed_time: DateTime<Utc>,
    pub tool_id: String,
    pub tool_name: String,
    pub state: ArtifactState,
}

impl Artifact {
    pub fn new(internal_name: InternalName, meta: NewArtifact, size_bytes: u64) -> Self {
        Self {
            internal_name,
            display_name: meta.display_name,
            size_bytes,
            processed_time: meta.processed_time,
            tool_id: meta.tool_id,
            tool_name: meta.tool_name,
            state: ArtifactState::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == ArtifactState::Active
    }

    pub(crate) fn mark_deleted(&mut self) {
        self.state = ArtifactState::Deleted;
    }

    /// Project this record into the shape handed to the request layer.
    pub fn view(&self, session: SessionId) -> ArtifactView {
        ArtifactView {
            internal_name: self.internal_name.clone(),
            display_name: self.display_name.clone(),
            size_bytes: self.size_bytes,
            processed_time: self.processed_time,
            tool_id: self.tool_id.clone(),
            tool_name: self.tool_name.clone(),
            download_ref: DownloadRef::new(session, &self.internal_name),
        }
    }
}

/// One row of `list_artifacts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactView {
    pub internal_name: InternalName,
    pub display_name: String,
    pub size_bytes: u64,
    pub processed_time: DateTime<Utc>,
    pub tool_id: String,
    pub tool_name: String,
    pub download_ref: DownloadRef,
}

//! Reports returned to the request layer.
//!
//! Every report here is a success value: delete and purge never fail because
//! something is already gone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::names::DownloadRef;

/// Result of a whole-session purge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeReport {
    pub deleted_count: usize,
    pub freed_bytes: u64,
}

impl PurgeReport {
    pub fn is_noop(&self) -> bool {
        self.deleted_count == 0
    }
}

/// Result of a single-artifact delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteReport {
    pub deleted: bool,
    pub freed_bytes: u64,
}

/// Result of a successful rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameReport {
    pub display_name: String,
    pub download_ref: DownloadRef,
}

/// What the presentation layer needs to draw its countdown.
///
/// The client derives its own remaining time from `deadline`;
/// `remaining_secs` is a convenience snapshot taken at `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    pub deadline: DateTime<Utc>,
    pub remaining_secs: u64,
    pub active: bool,
}

impl Countdown {
    pub fn at(deadline: DateTime<Utc>, now: DateTime<Utc>, purged: bool) -> Self {
        let active = !purged && now < deadline;
        let remaining_secs = if active {
            (deadline - now).num_seconds().max(0) as u64
        } else {
            0
        };
        Self {
            deadline,
            remaining_secs,
            active,
        }
    }
}

/// Per-session usage snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub artifact_count: usize,
    pub total_bytes: u64,
}

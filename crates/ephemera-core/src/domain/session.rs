//! Session record: the TTL-scoped container of artifacts.

use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;

use super::artifact::Artifact;
use super::ids::SessionId;
use super::names::InternalName;
use super::state::ExpiryPhase;

/// Session record.
///
/// Invariants:
/// - while `purged == false`, `display_name` is unique among active artifacts.
/// - once `purged == true`, `artifacts` is empty and stays empty.
///
/// The map preserves creation order; removals use `shift_remove` so listing
/// order survives deletes.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    deadline: DateTime<Utc>,
    purged: bool,
    purged_at: Option<DateTime<Utc>>,
    artifacts: IndexMap<InternalName, Artifact>,
}

impl Session {
    /// `created_at + ttl` saturates at the latest representable instant.
    pub fn new(id: SessionId, created_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            id,
            deadline: created_at
                .checked_add_signed(ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            purged: false,
            purged_at: None,
            artifacts: IndexMap::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    pub fn is_purged(&self) -> bool {
        self.purged
    }

    pub fn purged_at(&self) -> Option<DateTime<Utc>> {
        self.purged_at
    }

    /// Closed sessions read as empty and accept no new artifacts.
    pub fn is_closed(&self, now: DateTime<Utc>) -> bool {
        self.purged || now >= self.deadline
    }

    pub fn phase(&self, now: DateTime<Utc>) -> ExpiryPhase {
        if self.is_closed(now) {
            ExpiryPhase::Expired
        } else {
            ExpiryPhase::Open
        }
    }

    /// Due for the expiry scheduler: deadline reached but not yet purged.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.purged && now >= self.deadline
    }

    /// Active artifacts in creation order.
    pub fn active(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.values().filter(|a| a.is_active())
    }

    pub fn get(&self, internal_name: &InternalName) -> Option<&Artifact> {
        self.artifacts.get(internal_name).filter(|a| a.is_active())
    }

    pub fn contains(&self, internal_name: &InternalName) -> bool {
        self.artifacts.contains_key(internal_name)
    }

    /// The active artifact holding `display_name`, ignoring `except`.
    pub fn display_name_holder(
        &self,
        display_name: &str,
        except: Option<&InternalName>,
    ) -> Option<&InternalName> {
        self.active()
            .filter(|a| Some(&a.internal_name) != except)
            .find(|a| a.display_name == display_name)
            .map(|a| &a.internal_name)
    }

    pub(crate) fn insert(&mut self, artifact: Artifact) {
        debug_assert!(!self.purged, "insert into purged session");
        self.artifacts
            .insert(artifact.internal_name.clone(), artifact);
    }

    pub(crate) fn set_display_name(&mut self, internal_name: &InternalName, display_name: String) {
        if let Some(artifact) = self.artifacts.get_mut(internal_name) {
            artifact.display_name = display_name;
        }
    }

    /// Remove one artifact, returning it in the Deleted state.
    pub(crate) fn remove(&mut self, internal_name: &InternalName) -> Option<Artifact> {
        let mut artifact = self.artifacts.shift_remove(internal_name)?;
        artifact.mark_deleted();
        Some(artifact)
    }

    /// Purge the session.
    ///
    /// Returns `None` when the session was already purged. Otherwise returns
    /// every artifact that was active, in creation order, each marked Deleted.
    pub(crate) fn purge(&mut self, now: DateTime<Utc>) -> Option<Vec<Artifact>> {
        if self.purged {
            return None;
        }
        self.purged = true;
        self.purged_at = Some(now);
        let removed = self
            .artifacts
            .drain(..)
            .map(|(_, mut artifact)| {
                artifact.mark_deleted();
                artifact
            })
            .collect();
        Some(removed)
    }

    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    pub fn active_bytes(&self) -> u64 {
        self.active().map(|a| a.size_bytes).sum()
    }
}

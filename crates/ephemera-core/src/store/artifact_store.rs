//! ArtifactStore: session registry + per-session locking.

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tokio::sync::RwLock;

use super::RenameService;
use super::archive::{SessionArchive, archive_file_name, build_zip};
use crate::domain::names::{extension_of, sanitize_extension};
use crate::domain::{
    Artifact, Countdown, ExpiryPhase, InternalName, NewArtifact, PurgeReport, RenameReport,
    Session, SessionId, SessionStats, StoreError,
};
use crate::ports::{BlobStore, Clock, IdGenerator};

type SessionSlot = Arc<RwLock<Session>>;

/// Holds every live session and the metadata of its artifacts.
///
/// Design:
/// - The registry is a sharded map; shard locks are only held long enough to
///   clone a session handle, never across an await.
/// - Each session has its own `RwLock`. Mutations (create, rename, delete,
///   purge) take it exclusively for the whole critical section, including the
///   blob write/free. Reads (list, get, read) share it.
/// - Bytes are freed before metadata is dropped. If freeing fails the
///   metadata is left untouched and the error is returned, so a retry sees
///   the same state.
pub struct ArtifactStore {
    sessions: DashMap<SessionId, SessionSlot>,
    blobs: Arc<dyn BlobStore>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    renamer: RenameService,
    ttl: Duration,
}

impl ArtifactStore {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        renamer: RenameService,
        ttl: Duration,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            blobs,
            clock,
            ids,
            renamer,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn slot(&self, session: SessionId) -> Option<SessionSlot> {
        self.sessions.get(&session).map(|entry| Arc::clone(entry.value()))
    }

    /// Start a new session; its deadline is fixed here and never extended.
    pub fn open_session(&self) -> SessionId {
        let now = self.clock.now();
        loop {
            let id = self.ids.generate_session_id();
            if self.sessions.contains_key(&id) {
                continue;
            }
            let session = Session::new(id, now, self.ttl);
            let deadline = session.deadline();
            self.sessions.insert(id, Arc::new(RwLock::new(session)));
            tracing::debug!(session = %id, deadline = %deadline, "session opened");
            return id;
        }
    }

    /// Register a new active artifact and store its bytes.
    pub async fn create(
        &self,
        session: SessionId,
        meta: NewArtifact,
        bytes: Bytes,
    ) -> Result<InternalName, StoreError> {
        let slot = self
            .slot(session)
            .ok_or(StoreError::SessionNotFound(session))?;
        let mut guard = slot.write().await;

        if guard.is_closed(self.clock.now()) {
            return Err(StoreError::SessionClosed(session));
        }
        if let Some(holder) = guard.display_name_holder(&meta.display_name, None) {
            return Err(StoreError::NameCollision {
                name: meta.display_name,
                holder: holder.clone(),
            });
        }

        // internal name の拡張子は display_name から取る。保存名に使えない拡張子なら付けない
        let ext = extension_of(&meta.display_name);
        let ext = if sanitize_extension(ext).eq_ignore_ascii_case(ext) {
            ext
        } else {
            ""
        };
        let internal_name = loop {
            let candidate = self.ids.generate_internal_name(&meta.tool_id, ext);
            if !guard.contains(&candidate) {
                break candidate;
            }
        };

        let size_bytes = self.blobs.put(session, &internal_name, bytes).await?;
        guard.insert(Artifact::new(internal_name.clone(), meta, size_bytes));
        tracing::debug!(session = %session, internal_name = %internal_name, size_bytes, "artifact created");
        Ok(internal_name)
    }

    /// Look up one active artifact.
    pub async fn get(
        &self,
        session: SessionId,
        internal_name: &InternalName,
    ) -> Result<Artifact, StoreError> {
        let slot = self
            .slot(session)
            .ok_or(StoreError::SessionNotFound(session))?;
        let guard = slot.read().await;
        if guard.is_closed(self.clock.now()) {
            return Err(not_found(session, internal_name));
        }
        guard
            .get(internal_name)
            .cloned()
            .ok_or_else(|| not_found(session, internal_name))
    }

    /// Active artifacts in creation order; empty for closed or unknown sessions.
    pub async fn list(&self, session: SessionId) -> Vec<Artifact> {
        let Some(slot) = self.slot(session) else {
            return Vec::new();
        };
        let guard = slot.read().await;
        if guard.is_closed(self.clock.now()) {
            return Vec::new();
        }
        guard.active().cloned().collect()
    }

    /// Metadata and bytes of one artifact, for downloads.
    ///
    /// Holds the shared lock only while fetching; a delete that lands after
    /// this returns does not invalidate the bytes already handed out.
    pub async fn read(
        &self,
        session: SessionId,
        internal_name: &InternalName,
    ) -> Result<(Artifact, Bytes), StoreError> {
        let slot = self
            .slot(session)
            .ok_or(StoreError::SessionNotFound(session))?;
        let guard = slot.read().await;
        if guard.is_closed(self.clock.now()) {
            return Err(not_found(session, internal_name));
        }
        let artifact = guard
            .get(internal_name)
            .cloned()
            .ok_or_else(|| not_found(session, internal_name))?;
        let bytes = self.blobs.get(session, internal_name).await?;
        Ok((artifact, bytes))
    }

    /// Every active artifact zipped under its display name.
    ///
    /// The shared lock is held until the archive is built, so no delete,
    /// rename or purge can interleave with it.
    pub async fn archive(&self, session: SessionId) -> Result<SessionArchive, StoreError> {
        let slot = self
            .slot(session)
            .ok_or(StoreError::SessionNotFound(session))?;
        let guard = slot.read().await;
        let now = self.clock.now();
        if guard.is_closed(now) || guard.active_count() == 0 {
            return Err(StoreError::NothingToArchive(session));
        }

        let mut entries = Vec::with_capacity(guard.active_count());
        for artifact in guard.active() {
            let bytes = self.blobs.get(session, &artifact.internal_name).await?;
            entries.push((artifact.display_name.as_str(), bytes));
        }
        let (count, bytes) =
            build_zip(entries.iter().map(|(name, data)| (*name, data.as_ref())))?;
        tracing::debug!(session = %session, entries = count, size = bytes.len(), "session archived");
        Ok(SessionArchive {
            file_name: archive_file_name(now),
            entries: count,
            bytes,
        })
    }

    /// Change the display name of one artifact.
    pub async fn rename(
        &self,
        session: SessionId,
        internal_name: &InternalName,
        requested: &str,
    ) -> Result<RenameReport, StoreError> {
        let slot = self
            .slot(session)
            .ok_or(StoreError::SessionNotFound(session))?;
        let mut guard = slot.write().await;
        if guard.is_closed(self.clock.now()) {
            return Err(not_found(session, internal_name));
        }

        let report = self.renamer.validate(&guard, internal_name, requested)?;
        guard.set_display_name(internal_name, report.display_name.clone());
        tracing::debug!(
            session = %session,
            internal_name = %internal_name,
            display_name = %report.display_name,
            "artifact renamed"
        );
        Ok(report)
    }

    /// Remove one artifact. Returns the bytes freed, 0 if it was already gone.
    pub async fn delete_one(
        &self,
        session: SessionId,
        internal_name: &InternalName,
    ) -> Result<u64, StoreError> {
        let removed = self.take(session, internal_name).await?;
        Ok(removed.map_or(0, |a| a.size_bytes))
    }

    /// Remove one artifact and hand back its final (Deleted) record.
    ///
    /// `None` means another caller got there first, or it never existed.
    pub async fn take(
        &self,
        session: SessionId,
        internal_name: &InternalName,
    ) -> Result<Option<Artifact>, StoreError> {
        let Some(slot) = self.slot(session) else {
            return Ok(None);
        };
        let mut guard = slot.write().await;
        if guard.get(internal_name).is_none() {
            return Ok(None);
        }

        self.blobs.remove(session, internal_name).await?;
        let removed = guard.remove(internal_name);
        if let Some(artifact) = &removed {
            tracing::debug!(
                session = %session,
                internal_name = %internal_name,
                size_bytes = artifact.size_bytes,
                "artifact deleted"
            );
        }
        Ok(removed)
    }

    /// Purge the whole session. A second purge is a no-op reporting zero.
    pub async fn purge_all(&self, session: SessionId) -> Result<PurgeReport, StoreError> {
        let Some(slot) = self.slot(session) else {
            return Ok(PurgeReport::default());
        };
        let mut guard = slot.write().await;
        if guard.is_purged() {
            return Ok(PurgeReport::default());
        }

        self.blobs.remove_session(session).await?;
        let removed = guard.purge(self.clock.now()).unwrap_or_default();
        let report = PurgeReport {
            deleted_count: removed.len(),
            freed_bytes: removed.iter().map(|a| a.size_bytes).sum(),
        };
        tracing::debug!(
            session = %session,
            deleted_count = report.deleted_count,
            freed_bytes = report.freed_bytes,
            "session purged"
        );
        Ok(report)
    }

    pub async fn deadline(&self, session: SessionId) -> Result<DateTime<Utc>, StoreError> {
        let slot = self
            .slot(session)
            .ok_or(StoreError::SessionNotFound(session))?;
        let deadline = slot.read().await.deadline();
        Ok(deadline)
    }

    pub async fn countdown(&self, session: SessionId) -> Result<Countdown, StoreError> {
        let slot = self
            .slot(session)
            .ok_or(StoreError::SessionNotFound(session))?;
        let guard = slot.read().await;
        Ok(Countdown::at(
            guard.deadline(),
            self.clock.now(),
            guard.is_purged(),
        ))
    }

    pub async fn phase(&self, session: SessionId) -> Option<ExpiryPhase> {
        let slot = self.slot(session)?;
        let phase = slot.read().await.phase(self.clock.now());
        Some(phase)
    }

    pub async fn stats(&self, session: SessionId) -> SessionStats {
        let Some(slot) = self.slot(session) else {
            return SessionStats::default();
        };
        let guard = slot.read().await;
        if guard.is_closed(self.clock.now()) {
            return SessionStats::default();
        }
        SessionStats {
            artifact_count: guard.active_count(),
            total_bytes: guard.active_bytes(),
        }
    }

    /// Number of sessions known to the registry, tombstones included.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn snapshot(&self) -> Vec<(SessionId, SessionSlot)> {
        self.sessions
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect()
    }

    /// Sessions whose deadline has passed at `now` but are not purged yet.
    pub async fn due_sessions(&self, now: DateTime<Utc>) -> Vec<SessionId> {
        let mut due = Vec::new();
        for (id, slot) in self.snapshot() {
            if slot.read().await.is_due(now) {
                due.push(id);
            }
        }
        due.sort();
        due
    }

    /// Forget purged sessions whose purge happened at or before `cutoff`.
    ///
    /// An evicted session behaves like a purged one for delete/purge/list, so
    /// this only changes what `deadline`/`countdown` can report.
    pub async fn evict_tombstones(&self, cutoff: DateTime<Utc>) -> usize {
        let mut evicted = 0;
        for (id, slot) in self.snapshot() {
            let expired_tombstone = slot
                .read()
                .await
                .purged_at()
                .is_some_and(|at| at <= cutoff);
            if expired_tombstone && self.sessions.remove(&id).is_some() {
                evicted += 1;
            }
        }
        if evicted > 0 {
            tracing::debug!(evicted, "session tombstones evicted");
        }
        evicted
    }
}

fn not_found(session: SessionId, internal_name: &InternalName) -> StoreError {
    StoreError::NotFound {
        session,
        internal_name: internal_name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NameError, StorageError};
    use crate::impls::InMemoryBlobStore;
    use crate::ports::{FixedClock, UlidGenerator};
    use chrono::TimeZone;

    struct Fixture {
        store: Arc<ArtifactStore>,
        blobs: Arc<InMemoryBlobStore>,
        clock: Arc<FixedClock>,
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(FixedClock::new(t0()));
        let blobs = Arc::new(InMemoryBlobStore::new());
        let store = Arc::new(ArtifactStore::new(
            blobs.clone(),
            clock.clone(),
            Arc::new(UlidGenerator::new(clock.clone())),
            RenameService::new(255),
            Duration::minutes(30),
        ));
        Fixture { store, blobs, clock }
    }

    fn meta(display: &str) -> NewArtifact {
        NewArtifact::new(display, "merge", "Merge PDF", t0())
    }

    async fn add(f: &Fixture, session: SessionId, display: &str, size: usize) -> InternalName {
        f.store
            .create(session, meta(display), Bytes::from(vec![0u8; size]))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_then_list_in_creation_order() {
        let f = fixture();
        let s = f.store.open_session();
        let a = add(&f, s, "a.pdf", 10).await;
        let b = add(&f, s, "b.pdf", 20).await;

        let listed = f.store.list(s).await;
        let names: Vec<_> = listed.iter().map(|x| x.internal_name.clone()).collect();
        assert_eq!(names, vec![a.clone(), b]);
        assert_eq!(listed[0].size_bytes, 10);
        assert_eq!(a.extension(), ".pdf");
        assert!(a.as_str().starts_with("merge_"));
    }

    #[tokio::test]
    async fn create_rejects_duplicate_display_name() {
        let f = fixture();
        let s = f.store.open_session();
        add(&f, s, "a.pdf", 10).await;

        let err = f
            .store
            .create(s, meta("a.pdf"), Bytes::from_static(b"x"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NameCollision { .. }));
        assert_eq!(f.store.list(s).await.len(), 1);
        assert_eq!(f.blobs.total_bytes(), 10);
    }

    #[tokio::test]
    async fn create_into_unknown_or_closed_session_fails() {
        let f = fixture();
        let unknown = SessionId::from_ulid(ulid::Ulid::new());
        let err = f
            .store
            .create(unknown, meta("a.pdf"), Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::SessionNotFound(_)));

        let s = f.store.open_session();
        f.clock.advance(Duration::minutes(30));
        let err = f
            .store
            .create(s, meta("a.pdf"), Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::SessionClosed(_)));
    }

    #[tokio::test]
    async fn odd_extension_is_not_copied_into_internal_name() {
        let f = fixture();
        let s = f.store.open_session();
        let name = add(&f, s, "scan.p-df", 1).await;
        assert_eq!(name.extension(), "");
    }

    #[tokio::test]
    async fn get_and_read_return_metadata_and_bytes() {
        let f = fixture();
        let s = f.store.open_session();
        let a = f
            .store
            .create(s, meta("a.pdf"), Bytes::from_static(b"%PDF"))
            .await
            .unwrap();

        let artifact = f.store.get(s, &a).await.unwrap();
        assert_eq!(artifact.display_name, "a.pdf");

        let (artifact, bytes) = f.store.read(s, &a).await.unwrap();
        assert_eq!(artifact.size_bytes, 4);
        assert_eq!(bytes, Bytes::from_static(b"%PDF"));
    }

    #[tokio::test]
    async fn rename_swaps_display_name_only() {
        let f = fixture();
        let s = f.store.open_session();
        let a = add(&f, s, "result.pdf", 10).await;

        let report = f.store.rename(s, &a, "Quarterly Report").await.unwrap();
        assert_eq!(report.display_name, "Quarterly Report.pdf");

        let artifact = f.store.get(s, &a).await.unwrap();
        assert_eq!(artifact.internal_name, a);
        assert_eq!(artifact.display_name, "Quarterly Report.pdf");
        assert!(f.blobs.contains(s, &a));
    }

    #[tokio::test]
    async fn rename_collision_leaves_both_unchanged() {
        let f = fixture();
        let s = f.store.open_session();
        let a = add(&f, s, "a.pdf", 1).await;
        let b = add(&f, s, "b.pdf", 1).await;

        let err = f.store.rename(s, &a, "b.pdf").await.unwrap_err();
        assert!(matches!(err, StoreError::NameCollision { .. }));
        assert_eq!(f.store.get(s, &a).await.unwrap().display_name, "a.pdf");
        assert_eq!(f.store.get(s, &b).await.unwrap().display_name, "b.pdf");
    }

    #[tokio::test]
    async fn rename_invalid_name_is_validation_error() {
        let f = fixture();
        let s = f.store.open_session();
        let a = add(&f, s, "a.pdf", 1).await;

        let err = f.store.rename(s, &a, "../etc/passwd").await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(NameError::ForbiddenCharacter('/'))
        ));
        assert_eq!(f.store.get(s, &a).await.unwrap().display_name, "a.pdf");
    }

    #[tokio::test]
    async fn freed_name_can_be_reused() {
        let f = fixture();
        let s = f.store.open_session();
        let a = add(&f, s, "a.pdf", 1).await;
        let b = add(&f, s, "b.pdf", 1).await;

        f.store.delete_one(s, &b).await.unwrap();
        let report = f.store.rename(s, &a, "b").await.unwrap();
        assert_eq!(report.display_name, "b.pdf");
    }

    #[tokio::test]
    async fn delete_one_is_idempotent() {
        let f = fixture();
        let s = f.store.open_session();
        let a = add(&f, s, "a.pdf", 10).await;

        assert_eq!(f.store.delete_one(s, &a).await.unwrap(), 10);
        assert_eq!(f.store.delete_one(s, &a).await.unwrap(), 0);
        assert!(f.store.list(s).await.is_empty());
        assert!(!f.blobs.contains(s, &a));

        let unknown = SessionId::from_ulid(ulid::Ulid::new());
        assert_eq!(f.store.delete_one(unknown, &a).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn purge_all_twice() {
        let f = fixture();
        let s = f.store.open_session();
        add(&f, s, "a.pdf", 10).await;
        add(&f, s, "b.pdf", 20).await;

        let first = f.store.purge_all(s).await.unwrap();
        assert_eq!(first, PurgeReport { deleted_count: 2, freed_bytes: 30 });

        let second = f.store.purge_all(s).await.unwrap();
        assert!(second.is_noop());
        assert_eq!(second.freed_bytes, 0);
        assert_eq!(f.blobs.total_bytes(), 0);
    }

    #[tokio::test]
    async fn storage_failure_leaves_metadata_intact() {
        let f = fixture();
        let s = f.store.open_session();
        let a = add(&f, s, "a.pdf", 10).await;

        f.blobs.set_fail_removals(true);
        let err = f.store.delete_one(s, &a).await.unwrap_err();
        assert!(matches!(err, StoreError::Storage(StorageError::Backend(_))));
        assert!(err.is_retryable());
        let err = f.store.purge_all(s).await.unwrap_err();
        assert!(matches!(err, StoreError::Storage(_)));
        assert_eq!(f.store.list(s).await.len(), 1);

        f.blobs.set_fail_removals(false);
        assert_eq!(f.store.delete_one(s, &a).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn archive_uses_display_names() {
        use std::io::Read;

        let f = fixture();
        let s = f.store.open_session();
        let a = f
            .store
            .create(s, meta("result.pdf"), Bytes::from_static(b"%PDF-a"))
            .await
            .unwrap();
        f.store
            .create(s, meta("other.pdf"), Bytes::from_static(b"%PDF-b"))
            .await
            .unwrap();
        f.store.rename(s, &a, "Quarterly Report").await.unwrap();

        let archive = f.store.archive(s).await.unwrap();
        assert_eq!(archive.entries, 2);
        assert_eq!(archive.file_name, "processed_files_20240101_120000.zip");

        let mut zip = zip::ZipArchive::new(std::io::Cursor::new(archive.bytes.to_vec())).unwrap();
        let names: Vec<_> = (0..zip.len())
            .map(|i| zip.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec!["Quarterly Report.pdf", "other.pdf"]);

        let mut content = Vec::new();
        zip.by_name("Quarterly Report.pdf")
            .unwrap()
            .read_to_end(&mut content)
            .unwrap();
        assert_eq!(content, b"%PDF-a");
    }

    #[tokio::test]
    async fn archive_of_empty_or_closed_session_fails() {
        let f = fixture();
        let s = f.store.open_session();
        assert!(matches!(
            f.store.archive(s).await.unwrap_err(),
            StoreError::NothingToArchive(_)
        ));

        add(&f, s, "a.pdf", 1).await;
        f.clock.advance(Duration::minutes(30));
        assert!(matches!(
            f.store.archive(s).await.unwrap_err(),
            StoreError::NothingToArchive(_)
        ));

        let unknown = SessionId::from_ulid(ulid::Ulid::new());
        assert!(matches!(
            f.store.archive(unknown).await.unwrap_err(),
            StoreError::SessionNotFound(_)
        ));
    }

    #[tokio::test]
    async fn failed_write_leaves_no_metadata() {
        let f = fixture();
        let s = f.store.open_session();

        f.blobs.set_fail_puts(true);
        let err = f
            .store
            .create(s, meta("a.pdf"), Bytes::from_static(b"lost"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Storage(StorageError::Backend(_))));
        assert!(err.is_retryable());
        assert!(f.store.list(s).await.is_empty());
        assert_eq!(f.store.stats(s).await, SessionStats::default());

        // 同じ表示名で作り直せる
        f.blobs.set_fail_puts(false);
        let a = add(&f, s, "a.pdf", 4).await;
        assert_eq!(f.store.get(s, &a).await.unwrap().display_name, "a.pdf");
        assert_eq!(f.store.list(s).await.len(), 1);
    }

    #[tokio::test]
    async fn ttl_hides_artifacts_without_any_purge() {
        let f = fixture();
        let s = f.store.open_session();
        let a = add(&f, s, "a.pdf", 10).await;

        f.clock.advance(Duration::minutes(29) + Duration::seconds(59));
        assert_eq!(f.store.list(s).await.len(), 1);

        f.clock.advance(Duration::seconds(1));
        assert!(f.store.list(s).await.is_empty());
        assert!(matches!(
            f.store.get(s, &a).await.unwrap_err(),
            StoreError::NotFound { .. }
        ));
        assert!(matches!(
            f.store.rename(s, &a, "x").await.unwrap_err(),
            StoreError::NotFound { .. }
        ));
        assert_eq!(f.store.stats(s).await, SessionStats::default());
        assert_eq!(f.store.phase(s).await, Some(ExpiryPhase::Expired));

        // 期限切れでも purge はまだ。バイト列の解放はスケジューラ（か手動 purge）が行う
        assert_eq!(f.store.due_sessions(f.clock.now()).await, vec![s]);
        let report = f.store.purge_all(s).await.unwrap();
        assert_eq!(report.freed_bytes, 10);
    }

    #[tokio::test]
    async fn deadline_is_fixed_at_open() {
        let f = fixture();
        let s = f.store.open_session();
        add(&f, s, "a.pdf", 1).await;
        f.clock.advance(Duration::minutes(10));
        add(&f, s, "b.pdf", 1).await;

        assert_eq!(f.store.deadline(s).await.unwrap(), t0() + Duration::minutes(30));
        let countdown = f.store.countdown(s).await.unwrap();
        assert_eq!(countdown.remaining_secs, 20 * 60);
        assert!(countdown.active);
    }

    #[tokio::test]
    async fn sessions_are_independent() {
        let f = fixture();
        let s1 = f.store.open_session();
        let s2 = f.store.open_session();
        add(&f, s1, "same.pdf", 1).await;
        add(&f, s2, "same.pdf", 2).await;

        f.store.purge_all(s1).await.unwrap();
        assert!(f.store.list(s1).await.is_empty());
        assert_eq!(f.store.list(s2).await.len(), 1);
        assert_eq!(f.store.stats(s2).await.total_bytes, 2);
    }

    #[tokio::test]
    async fn tombstones_are_evicted_after_cutoff() {
        let f = fixture();
        let s = f.store.open_session();
        let live = f.store.open_session();
        f.store.purge_all(s).await.unwrap();
        assert_eq!(f.store.session_count(), 2);

        assert_eq!(f.store.evict_tombstones(t0() - Duration::seconds(1)).await, 0);
        assert_eq!(f.store.evict_tombstones(t0()).await, 1);
        assert_eq!(f.store.session_count(), 1);

        // evict 後も purge / delete / list は purge 済みと同じ振る舞い
        assert!(f.store.purge_all(s).await.unwrap().is_noop());
        assert!(f.store.list(s).await.is_empty());
        assert!(f.store.phase(live).await.is_some());
    }

    #[tokio::test]
    async fn concurrent_renames_to_same_name_one_wins() {
        let f = fixture();
        let s = f.store.open_session();
        let a = add(&f, s, "a.pdf", 1).await;
        let b = add(&f, s, "b.pdf", 1).await;

        let (ra, rb) = tokio::join!(
            f.store.rename(s, &a, "n"),
            f.store.rename(s, &b, "n"),
        );
        let results = [ra, rb];
        let ok = results.iter().filter(|r| r.is_ok()).count();
        let collisions = results
            .iter()
            .filter(|r| matches!(r, Err(StoreError::NameCollision { .. })))
            .count();
        assert_eq!((ok, collisions), (1, 1));

        let names: Vec<_> = f.store.list(s).await.into_iter().map(|x| x.display_name).collect();
        assert_eq!(names.iter().filter(|n| *n == "n.pdf").count(), 1);
    }
}

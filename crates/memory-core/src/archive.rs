use crate::clock::Clock;
use crate::error::{MemoryError, Result};
use crate::repository::SessionRepository;
use crate::session::Session;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchiveResult {
    pub archived: bool,
    pub session_id: String,
    pub archive_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanResult {
    pub cleaned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_file: Option<PathBuf>,
}

impl CleanResult {
    fn nothing() -> Self {
        Self {
            cleaned: false,
            session_id: None,
            archive_file: None,
        }
    }
}

/// Moves sessions out of the active slot into immutable snapshots.
pub struct ArchiveManager<'a, R: SessionRepository> {
    repo: &'a R,
    clock: &'a dyn Clock,
}

impl<'a, R: SessionRepository> ArchiveManager<'a, R> {
    pub fn new(repo: &'a R, clock: &'a dyn Clock) -> Self {
        Self { repo, clock }
    }

    /// Snapshot whatever occupies the active slot, expired or not, then clear it.
    pub fn archive_session(&self) -> Result<ArchiveResult> {
        let session = self
            .repo
            .get_active()?
            .ok_or(MemoryError::SessionNotFound)?;
        let archive_file = self.archive_snapshot(&session)?;
        Ok(ArchiveResult {
            archived: true,
            session_id: session.session_id,
            archive_file,
        })
    }

    /// Archive the active session if its lifetime has run out; otherwise do nothing.
    pub fn clean_expired(&self) -> Result<CleanResult> {
        let Some(session) = self.repo.get_active()? else {
            return Ok(CleanResult::nothing());
        };
        if !session.is_expired(self.clock.now()) {
            return Ok(CleanResult::nothing());
        }
        let archive_file = self.archive_snapshot(&session)?;
        Ok(CleanResult {
            cleaned: true,
            session_id: Some(session.session_id),
            archive_file: Some(archive_file),
        })
    }

    pub fn get_archive(&self, session_id: &str) -> Result<Session> {
        self.repo
            .get_archive(session_id)?
            .ok_or_else(|| MemoryError::ArchiveNotFound(session_id.to_string()))
    }

    pub fn list_archives(&self) -> Result<Vec<String>> {
        self.repo.list_archives()
    }

    /// The snapshot is written before the slot is cleared; a failure in
    /// between leaves the session active.
    pub(crate) fn archive_snapshot(&self, session: &Session) -> Result<PathBuf> {
        let archive_file = self.repo.put_archive(session)?;
        self.repo.clear_active()?;
        info!(
            session_id = %session.session_id,
            changes = session.recent_changes.len(),
            archive = %archive_file.display(),
            "session archived"
        );
        Ok(archive_file)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::repository::{FsSessionRepository, MemorySessionRepository};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use tempfile::TempDir;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
    }

    fn seeded<R: SessionRepository>(repo: &R) -> Session {
        let mut s = Session::new("2024-01-01-morning", start(), Duration::hours(24));
        s.add_bug("login 500");
        s.context_notes.push("auth uses JWT".into());
        repo.set_active(&s).unwrap();
        s
    }

    #[test]
    fn archive_roundtrip_reproduces_session() {
        let dir = TempDir::new().unwrap();
        let repo = FsSessionRepository::new(dir.path());
        let clock = FixedClock::new(start());
        let original = seeded(&repo);

        let mgr = ArchiveManager::new(&repo, &clock);
        let result = mgr.archive_session().unwrap();
        assert!(result.archived);
        assert_eq!(result.session_id, "2024-01-01-morning");
        assert!(result.archive_file.exists());
        assert!(repo.get_active().unwrap().is_none());

        assert_eq!(mgr.get_archive("2024-01-01-morning").unwrap(), original);
    }

    #[test]
    fn archive_without_session_is_not_found() {
        let repo = MemorySessionRepository::new();
        let clock = FixedClock::new(start());
        let mgr = ArchiveManager::new(&repo, &clock);
        assert!(matches!(
            mgr.archive_session(),
            Err(MemoryError::SessionNotFound)
        ));
    }

    #[test]
    fn rearchive_overwrites_snapshot() {
        let repo = MemorySessionRepository::new();
        let clock = FixedClock::new(start());
        let mgr = ArchiveManager::new(&repo, &clock);

        seeded(&repo);
        mgr.archive_session().unwrap();

        let mut second = seeded(&repo);
        second.context_notes.push("second pass".into());
        repo.set_active(&second).unwrap();
        mgr.archive_session().unwrap();

        assert_eq!(mgr.list_archives().unwrap().len(), 1);
        assert_eq!(mgr.get_archive("2024-01-01-morning").unwrap(), second);
    }

    #[test]
    fn clean_expired_noop_before_expiry() {
        let repo = MemorySessionRepository::new();
        let clock = FixedClock::new(start() + Duration::hours(23));
        seeded(&repo);

        let result = ArchiveManager::new(&repo, &clock).clean_expired().unwrap();
        assert!(!result.cleaned);
        assert!(repo.get_active().unwrap().is_some());
    }

    #[test]
    fn clean_expired_archives_at_expiry() {
        let repo = MemorySessionRepository::new();
        let clock = FixedClock::new(start() + Duration::hours(24));
        seeded(&repo);

        let result = ArchiveManager::new(&repo, &clock).clean_expired().unwrap();
        assert!(result.cleaned);
        assert_eq!(result.session_id.as_deref(), Some("2024-01-01-morning"));
        assert!(repo.get_active().unwrap().is_none());
        assert_eq!(repo.list_archives().unwrap(), vec!["2024-01-01-morning"]);
    }

    #[test]
    fn clean_expired_with_empty_slot() {
        let repo = MemorySessionRepository::new();
        let clock = FixedClock::new(start());
        let result = ArchiveManager::new(&repo, &clock).clean_expired().unwrap();
        assert_eq!(result, CleanResult::nothing());
    }

    #[test]
    fn missing_archive_is_not_found() {
        let repo = MemorySessionRepository::new();
        let clock = FixedClock::new(start());
        let err = ArchiveManager::new(&repo, &clock)
            .get_archive("2020-01-01-evening")
            .unwrap_err();
        assert!(matches!(err, MemoryError::ArchiveNotFound(_)));
    }
}

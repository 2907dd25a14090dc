use crate::error::Result;
use crate::paths;
use crate::session::Session;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// Storage for the single active-session slot and the archive of closed sessions.
///
/// Every call goes to storage; implementations keep no cache of the active
/// session between calls.
pub trait SessionRepository {
    fn get_active(&self) -> Result<Option<Session>>;
    fn set_active(&self, session: &Session) -> Result<()>;
    /// Empty the slot. Returns false when it was already empty.
    fn clear_active(&self) -> Result<bool>;

    /// Store an archive snapshot, replacing any earlier snapshot with the same id.
    /// Returns the location it was written to.
    fn put_archive(&self, session: &Session) -> Result<PathBuf>;
    fn get_archive(&self, session_id: &str) -> Result<Option<Session>>;
    /// Archived session ids, sorted.
    fn list_archives(&self) -> Result<Vec<String>>;
}

// ---------------------------------------------------------------------------
// Filesystem
// ---------------------------------------------------------------------------

/// JSON documents under `<root>/.claude-memory/session/`.
#[derive(Debug, Clone)]
pub struct FsSessionRepository {
    root: PathBuf,
}

impl FsSessionRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SessionRepository for FsSessionRepository {
    fn get_active(&self) -> Result<Option<Session>> {
        crate::io::read_json(&paths::current_session_path(&self.root))
    }

    fn set_active(&self, session: &Session) -> Result<()> {
        crate::io::write_json(&paths::current_session_path(&self.root), session)
    }

    fn clear_active(&self) -> Result<bool> {
        crate::io::remove_if_exists(&paths::current_session_path(&self.root))
    }

    fn put_archive(&self, session: &Session) -> Result<PathBuf> {
        paths::validate_session_id(&session.session_id)?;
        let path = paths::archive_path(&self.root, &session.session_id);
        crate::io::write_json(&path, session)?;
        Ok(path)
    }

    fn get_archive(&self, session_id: &str) -> Result<Option<Session>> {
        paths::validate_session_id(session_id)?;
        crate::io::read_json(&paths::archive_path(&self.root, session_id))
    }

    fn list_archives(&self) -> Result<Vec<String>> {
        let dir = paths::archive_dir(&self.root);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if paths::is_valid_session_id(stem) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Process-local repository for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemorySessionRepository {
    active: Mutex<Option<Session>>,
    archive: Mutex<BTreeMap<String, Session>>,
}

impl MemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionRepository for MemorySessionRepository {
    fn get_active(&self) -> Result<Option<Session>> {
        Ok(self.active.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn set_active(&self, session: &Session) -> Result<()> {
        *self.active.lock().unwrap_or_else(|e| e.into_inner()) = Some(session.clone());
        Ok(())
    }

    fn clear_active(&self) -> Result<bool> {
        Ok(self
            .active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .is_some())
    }

    fn put_archive(&self, session: &Session) -> Result<PathBuf> {
        paths::validate_session_id(&session.session_id)?;
        self.archive
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(session.session_id.clone(), session.clone());
        Ok(PathBuf::from(format!("memory://archive/{}", session.session_id)))
    }

    fn get_archive(&self, session_id: &str) -> Result<Option<Session>> {
        Ok(self
            .archive
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(session_id)
            .cloned())
    }

    fn list_archives(&self) -> Result<Vec<String>> {
        Ok(self
            .archive
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::TempDir;

    fn session(id: &str) -> Session {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        Session::new(id, start, Duration::hours(24))
    }

    fn exercise(repo: &dyn SessionRepository) {
        assert!(repo.get_active().unwrap().is_none());
        assert!(!repo.clear_active().unwrap());

        let s = session("2024-01-01-morning");
        repo.set_active(&s).unwrap();
        assert_eq!(repo.get_active().unwrap(), Some(s.clone()));

        repo.put_archive(&s).unwrap();
        repo.put_archive(&session("2023-12-31-evening")).unwrap();
        assert_eq!(
            repo.list_archives().unwrap(),
            vec!["2023-12-31-evening", "2024-01-01-morning"]
        );
        assert_eq!(repo.get_archive("2024-01-01-morning").unwrap(), Some(s));
        assert!(repo.get_archive("2024-02-02-morning").unwrap().is_none());

        assert!(repo.clear_active().unwrap());
        assert!(repo.get_active().unwrap().is_none());
    }

    #[test]
    fn fs_repository_contract() {
        let dir = TempDir::new().unwrap();
        exercise(&FsSessionRepository::new(dir.path()));
        assert!(dir
            .path()
            .join(".claude-memory/session/archive/2024-01-01-morning.json")
            .exists());
    }

    #[test]
    fn memory_repository_contract() {
        exercise(&MemorySessionRepository::new());
    }

    #[test]
    fn fs_archive_rejects_path_like_ids() {
        let dir = TempDir::new().unwrap();
        let repo = FsSessionRepository::new(dir.path());
        assert!(repo.get_archive("../current").is_err());
        assert!(repo.put_archive(&session("../../escape")).is_err());
    }

    #[test]
    fn fs_list_ignores_foreign_files() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join(".claude-memory/session/archive");
        std::fs::create_dir_all(&archive).unwrap();
        std::fs::write(archive.join("notes.txt"), "x").unwrap();
        std::fs::write(archive.join("scratch.json"), "{}").unwrap();
        let repo = FsSessionRepository::new(dir.path());
        assert!(repo.list_archives().unwrap().is_empty());
    }
}

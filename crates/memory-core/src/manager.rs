use crate::archive::ArchiveManager;
use crate::clock::Clock;
use crate::config::{Config, CreatePolicy};
use crate::error::{MemoryError, Result};
use crate::repository::SessionRepository;
use crate::session::{ChangeRecord, Session};
use crate::time::session_id_for;
use crate::types::ChangeAction;
use crate::update::{BugOp, NoteAppend, SessionUpdate, UpdateOutcome};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedChange {
    pub recorded: bool,
    pub change: ChangeRecord,
    /// Size of the change ring after this record.
    pub total_changes: usize,
    /// Files tracked under the current task after this record.
    pub total_files: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateResult {
    pub session: Session,
    pub outcomes: Vec<UpdateOutcome>,
}

/// Owns the lifecycle and contents of the active session.
///
/// Mutating calls on a missing or expired session create a new one when
/// `auto_create_session` is on, and fail with `SessionNotFound` otherwise.
pub struct SessionManager<'a, R: SessionRepository> {
    repo: &'a R,
    clock: &'a dyn Clock,
    config: &'a Config,
}

impl<'a, R: SessionRepository> SessionManager<'a, R> {
    pub fn new(repo: &'a R, clock: &'a dyn Clock, config: &'a Config) -> Self {
        Self {
            repo,
            clock,
            config,
        }
    }

    fn archives(&self) -> ArchiveManager<'a, R> {
        ArchiveManager::new(self.repo, self.clock)
    }

    /// The active session, or `None` when the slot is empty or its session expired.
    pub fn get_current_session(&self) -> Result<Option<Session>> {
        let now = self.clock.now();
        Ok(self.repo.get_active()?.filter(|s| !s.is_expired(now)))
    }

    pub fn create_session(&self) -> Result<Session> {
        self.create_session_with(self.config.create_policy)
    }

    pub fn create_session_with(&self, policy: CreatePolicy) -> Result<Session> {
        let now = self.clock.now();

        if let Some(existing) = self.repo.get_active()? {
            if existing.is_expired(now) {
                debug!(session_id = %existing.session_id, "archiving expired session before create");
                self.archives().archive_snapshot(&existing)?;
            } else {
                match policy {
                    CreatePolicy::Reuse => {
                        debug!(session_id = %existing.session_id, "reusing active session");
                        return Ok(existing);
                    }
                    CreatePolicy::Strict => {
                        return Err(MemoryError::SessionExists(existing.session_id));
                    }
                    CreatePolicy::Replace => {
                        self.archives().archive_snapshot(&existing)?;
                    }
                }
            }
        }

        let id = session_id_for(now, self.config.offset());
        let session = Session::new(id, now, self.config.session_ttl());
        self.repo.set_active(&session)?;
        info!(
            session_id = %session.session_id,
            expires_at = %session.expires_at,
            "session created"
        );
        Ok(session)
    }

    fn session_for_write(&self) -> Result<Session> {
        if let Some(session) = self.get_current_session()? {
            return Ok(session);
        }
        if !self.config.auto_create_session {
            return Err(MemoryError::SessionNotFound);
        }
        info!("no active session, creating one");
        self.create_session_with(CreatePolicy::Reuse)
    }

    /// Apply `updates` in order and persist once.
    pub fn update_session(&self, updates: Vec<SessionUpdate>) -> Result<UpdateResult> {
        let mut session = self.session_for_write()?;
        let now = self.clock.now();
        let mut outcomes = Vec::new();
        for update in updates {
            outcomes.extend(session.apply(update, now, self.config.note_dedup));
        }
        self.repo.set_active(&session)?;
        debug!(session_id = %session.session_id, applied = outcomes.len(), "session updated");
        Ok(UpdateResult { session, outcomes })
    }

    pub fn record_change(
        &self,
        file: &str,
        action: ChangeAction,
        description: &str,
    ) -> Result<RecordedChange> {
        let mut session = self.session_for_write()?;
        let change = ChangeRecord {
            file: file.to_string(),
            action,
            description: description.to_string(),
            timestamp: self.clock.now(),
        };
        session.track_file(&change.file);
        let evicted = session.push_change(change.clone());
        self.repo.set_active(&session)?;
        debug!(file = %change.file, action = %action, evicted, "change recorded");
        Ok(RecordedChange {
            recorded: true,
            change,
            total_changes: session.recent_changes.len(),
            total_files: session.current_task.files.len(),
        })
    }

    /// Returns false when the note is blank or duplicates an existing one.
    pub fn add_note(&self, text: &str) -> Result<bool> {
        let result = self.update_session(vec![SessionUpdate::AppendNote(NoteAppend {
            text: text.to_string(),
        })])?;
        Ok(matches!(
            result.outcomes.first(),
            Some(UpdateOutcome::NoteAdded { .. })
        ))
    }

    /// Returns false when the bug was already listed.
    pub fn add_bug(&self, text: &str) -> Result<bool> {
        let result =
            self.update_session(vec![SessionUpdate::Bug(BugOp::Add(text.to_string()))])?;
        Ok(matches!(
            result.outcomes.first(),
            Some(UpdateOutcome::BugAdded { .. })
        ))
    }

    /// Returns false when the bug was not listed.
    pub fn remove_bug(&self, text: &str) -> Result<bool> {
        let result =
            self.update_session(vec![SessionUpdate::Bug(BugOp::Remove(text.to_string()))])?;
        Ok(matches!(
            result.outcomes.first(),
            Some(UpdateOutcome::BugRemoved { .. })
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

use crate::config::NoteDedup;
use crate::types::{ChangeAction, Progress};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Capacity of the recent-changes ring. The oldest record is dropped on overflow.
pub const RECENT_CHANGES_CAPACITY: usize = 20;

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentTask {
    #[serde(default)]
    pub feature: Option<String>,
    #[serde(default)]
    pub progress: Progress,
    /// Absolute paths in first-touched order, no duplicates.
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    pub file: String,
    pub action: ChangeAction,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub current_task: CurrentTask,
    #[serde(default)]
    pub recent_changes: Vec<ChangeRecord>,
    #[serde(default)]
    pub context_notes: Vec<String>,
    #[serde(default)]
    pub active_bugs: Vec<String>,
}

impl Session {
    pub fn new(session_id: impl Into<String>, started_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            session_id: session_id.into(),
            started_at,
            expires_at: started_at
                .checked_add_signed(ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            current_task: CurrentTask::default(),
            recent_changes: Vec::new(),
            context_notes: Vec::new(),
            active_bugs: Vec::new(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        now - self.started_at
    }

    // -----------------------------------------------------------------------
    // Recent changes
    // -----------------------------------------------------------------------

    /// Append to the ring, evicting from the front past capacity.
    /// Returns how many records were evicted.
    pub fn push_change(&mut self, change: ChangeRecord) -> usize {
        self.recent_changes.push(change);
        self.enforce_change_capacity()
    }

    /// Replace the whole history, keeping only the newest records that fit.
    pub fn replace_changes(&mut self, changes: Vec<ChangeRecord>) -> usize {
        self.recent_changes = changes;
        self.enforce_change_capacity()
    }

    fn enforce_change_capacity(&mut self) -> usize {
        let len = self.recent_changes.len();
        if len <= RECENT_CHANGES_CAPACITY {
            return 0;
        }
        let excess = len - RECENT_CHANGES_CAPACITY;
        self.recent_changes.drain(..excess);
        excess
    }

    pub fn is_change_buffer_full(&self) -> bool {
        self.recent_changes.len() >= RECENT_CHANGES_CAPACITY
    }

    /// Changes grouped by file, files in order of first appearance.
    pub fn changes_by_file(&self) -> Vec<(&str, Vec<&ChangeRecord>)> {
        group_by_file(&self.recent_changes)
    }

    // -----------------------------------------------------------------------
    // Task files
    // -----------------------------------------------------------------------

    /// Add `file` to the task's file list. Returns false if it was already there.
    pub fn track_file(&mut self, file: &str) -> bool {
        if self.current_task.files.iter().any(|f| f == file) {
            return false;
        }
        self.current_task.files.push(file.to_string());
        true
    }

    // -----------------------------------------------------------------------
    // Notes and bugs
    // -----------------------------------------------------------------------

    pub fn add_note(&mut self, text: &str, dedup: NoteDedup) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        let duplicate = match dedup {
            NoteDedup::Latest => self.context_notes.last().is_some_and(|n| n == text),
            NoteDedup::Any => self.context_notes.iter().any(|n| n == text),
        };
        if duplicate {
            return false;
        }
        self.context_notes.push(text.to_string());
        true
    }

    pub fn add_bug(&mut self, text: &str) -> bool {
        if self.active_bugs.iter().any(|b| b == text) {
            return false;
        }
        self.active_bugs.push(text.to_string());
        true
    }

    pub fn remove_bug(&mut self, text: &str) -> bool {
        let before = self.active_bugs.len();
        self.active_bugs.retain(|b| b != text);
        self.active_bugs.len() != before
    }
}

/// Group change records by file, keeping first-appearance order of files and
/// chronological order within each file.
pub fn group_by_file<'a>(changes: &'a [ChangeRecord]) -> Vec<(&'a str, Vec<&'a ChangeRecord>)> {
    let mut groups: Vec<(&str, Vec<&ChangeRecord>)> = Vec::new();
    for change in changes {
        match groups.iter_mut().find(|(f, _)| *f == change.file) {
            Some((_, list)) => list.push(change),
            None => groups.push((change.file.as_str(), vec![change])),
        }
    }
    groups
}

/// Per-action counts, most frequent first, ties in first-seen order.
pub fn action_counts(changes: &[ChangeRecord]) -> Vec<(ChangeAction, usize)> {
    let mut counts: Vec<(ChangeAction, usize)> = Vec::new();
    for change in changes {
        match counts.iter_mut().find(|(a, _)| *a == change.action) {
            Some((_, n)) => *n += 1,
            None => counts.push((change.action, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

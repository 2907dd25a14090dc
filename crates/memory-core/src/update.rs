//! Tagged session updates. Each variant owns the merge rule for its field group.

use crate::config::NoteDedup;
use crate::session::{ChangeRecord, Session};
use crate::types::{ChangeAction, Progress};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

// ---------------------------------------------------------------------------
// Update payloads
// ---------------------------------------------------------------------------

/// Changes to `currentTask`. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskUpdate {
    /// `Some(None)` clears the feature.
    pub feature: Option<Option<String>>,
    pub progress: Option<Progress>,
    pub add_files: Vec<String>,
    pub add_next_step: Option<String>,
    pub clear_next_steps: bool,
}

impl TaskUpdate {
    pub fn feature(mut self, feature: impl Into<String>) -> Self {
        self.feature = Some(Some(feature.into()));
        self
    }

    pub fn progress(mut self, progress: Progress) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn next_step(mut self, step: impl Into<String>) -> Self {
        self.add_next_step = Some(step.into());
        self
    }

    pub fn clear_next_steps(mut self) -> Self {
        self.clear_next_steps = true;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.feature.is_none()
            && self.progress.is_none()
            && self.add_files.is_empty()
            && self.add_next_step.is_none()
            && !self.clear_next_steps
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChangeAppend {
    pub file: String,
    pub action: ChangeAction,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NoteAppend {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BugOp {
    Add(String),
    Remove(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    Task(TaskUpdate),
    AppendChange(ChangeAppend),
    /// Wholesale replacement; still capped to the newest records.
    ReplaceChanges(Vec<ChangeRecord>),
    AppendNote(NoteAppend),
    Bug(BugOp),
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UpdateOutcome {
    FeatureSet { feature: Option<String> },
    ProgressSet { progress: Progress },
    FileTracked { file: String },
    NextStepAdded { step: String },
    NextStepsCleared,
    ChangeRecorded { change: ChangeRecord, evicted: usize },
    ChangesReplaced { kept: usize, dropped: usize },
    NoteAdded { note: String },
    NoteExists { note: String },
    NoteEmpty,
    BugAdded { bug: String },
    BugExists { bug: String },
    BugRemoved { bug: String },
    BugNotFound { bug: String },
}

impl fmt::Display for UpdateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateOutcome::FeatureSet { feature: Some(x) } => write!(f, "Feature: \"{x}\""),
            UpdateOutcome::FeatureSet { feature: None } => f.write_str("Feature cleared"),
            UpdateOutcome::ProgressSet { progress } => write!(f, "Progress: {progress}"),
            UpdateOutcome::FileTracked { file } => write!(f, "Tracking file: {file}"),
            UpdateOutcome::NextStepAdded { step } => write!(f, "Added next step: \"{step}\""),
            UpdateOutcome::NextStepsCleared => f.write_str("Cleared all next steps"),
            UpdateOutcome::ChangeRecorded { change, .. } => {
                write!(f, "Recorded {}: {}", change.action, change.file)
            }
            UpdateOutcome::ChangesReplaced { kept, dropped } => {
                write!(f, "Replaced recent changes ({kept} kept, {dropped} dropped)")
            }
            UpdateOutcome::NoteAdded { note } => write!(f, "Added note: \"{note}\""),
            UpdateOutcome::NoteExists { note } => write!(f, "Note already exists: \"{note}\""),
            UpdateOutcome::NoteEmpty => write!(f, "Ignored empty note"),
            UpdateOutcome::BugAdded { bug } => write!(f, "Added bug: \"{bug}\""),
            UpdateOutcome::BugExists { bug } => write!(f, "Bug already exists: \"{bug}\""),
            UpdateOutcome::BugRemoved { bug } => write!(f, "Removed bug: \"{bug}\""),
            UpdateOutcome::BugNotFound { bug } => write!(f, "Bug not found: \"{bug}\""),
        }
    }
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

impl Session {
    /// Merge one update into the session. `now` stamps appended change records.
    pub fn apply(
        &mut self,
        update: SessionUpdate,
        now: DateTime<Utc>,
        dedup: NoteDedup,
    ) -> Vec<UpdateOutcome> {
        let mut out = Vec::new();
        match update {
            SessionUpdate::Task(task) => self.apply_task(task, &mut out),
            SessionUpdate::AppendChange(append) => {
                let change = ChangeRecord {
                    file: append.file,
                    action: append.action,
                    description: append.description,
                    timestamp: now,
                };
                if self.track_file(&change.file) {
                    out.push(UpdateOutcome::FileTracked {
                        file: change.file.clone(),
                    });
                }
                let evicted = self.push_change(change.clone());
                out.push(UpdateOutcome::ChangeRecorded { change, evicted });
            }
            SessionUpdate::ReplaceChanges(changes) => {
                let dropped = self.replace_changes(changes);
                out.push(UpdateOutcome::ChangesReplaced {
                    kept: self.recent_changes.len(),
                    dropped,
                });
            }
            SessionUpdate::AppendNote(NoteAppend { text }) => {
                if text.trim().is_empty() {
                    out.push(UpdateOutcome::NoteEmpty);
                } else if self.add_note(&text, dedup) {
                    out.push(UpdateOutcome::NoteAdded { note: text });
                } else {
                    out.push(UpdateOutcome::NoteExists { note: text });
                }
            }
            SessionUpdate::Bug(BugOp::Add(bug)) => {
                if self.add_bug(&bug) {
                    out.push(UpdateOutcome::BugAdded { bug });
                } else {
                    out.push(UpdateOutcome::BugExists { bug });
                }
            }
            SessionUpdate::Bug(BugOp::Remove(bug)) => {
                if self.remove_bug(&bug) {
                    out.push(UpdateOutcome::BugRemoved { bug });
                } else {
                    out.push(UpdateOutcome::BugNotFound { bug });
                }
            }
        }
        out
    }

    fn apply_task(&mut self, task: TaskUpdate, out: &mut Vec<UpdateOutcome>) {
        if let Some(feature) = task.feature {
            self.current_task.feature = feature.clone();
            out.push(UpdateOutcome::FeatureSet { feature });
        }
        if let Some(progress) = task.progress {
            self.current_task.progress = progress;
            out.push(UpdateOutcome::ProgressSet { progress });
        }
        for file in task.add_files {
            if self.track_file(&file) {
                out.push(UpdateOutcome::FileTracked { file });
            }
        }
        // Clearing first lets one update replace the list with a single step.
        if task.clear_next_steps {
            self.current_task.next_steps.clear();
            out.push(UpdateOutcome::NextStepsCleared);
        }
        if let Some(step) = task.add_next_step {
            self.current_task.next_steps.push(step.clone());
            out.push(UpdateOutcome::NextStepAdded { step });
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

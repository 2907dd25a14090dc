use crate::error::MemoryError;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ChangeAction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Created,
    #[serde(rename = "created/updated")]
    CreatedUpdated,
    Modified,
    Deleted,
    Staged,
    Committed,
    BashCommand,
    Changed,
}

impl ChangeAction {
    pub fn all() -> &'static [ChangeAction] {
        &[
            ChangeAction::Created,
            ChangeAction::CreatedUpdated,
            ChangeAction::Modified,
            ChangeAction::Deleted,
            ChangeAction::Staged,
            ChangeAction::Committed,
            ChangeAction::BashCommand,
            ChangeAction::Changed,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChangeAction::Created => "created",
            ChangeAction::CreatedUpdated => "created/updated",
            ChangeAction::Modified => "modified",
            ChangeAction::Deleted => "deleted",
            ChangeAction::Staged => "staged",
            ChangeAction::Committed => "committed",
            ChangeAction::BashCommand => "bash_command",
            ChangeAction::Changed => "changed",
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts the canonical names plus the verb forms people type by hand
/// (`create`, `update`, `modify`, `delete`, `stage`, `commit`), case-insensitively.
impl std::str::FromStr for ChangeAction {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "created" | "create" => Ok(ChangeAction::Created),
            "created/updated" | "update" => Ok(ChangeAction::CreatedUpdated),
            "modified" | "modify" => Ok(ChangeAction::Modified),
            "deleted" | "delete" => Ok(ChangeAction::Deleted),
            "staged" | "stage" => Ok(ChangeAction::Staged),
            "committed" | "commit" => Ok(ChangeAction::Committed),
            "bash_command" => Ok(ChangeAction::BashCommand),
            "changed" => Ok(ChangeAction::Changed),
            _ => Err(MemoryError::InvalidAction(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Progress {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Blocked,
}

impl Progress {
    pub fn as_str(self) -> &'static str {
        match self {
            Progress::NotStarted => "not_started",
            Progress::InProgress => "in_progress",
            Progress::Completed => "completed",
            Progress::Blocked => "blocked",
        }
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Progress {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(Progress::NotStarted),
            "in_progress" => Ok(Progress::InProgress),
            "completed" => Ok(Progress::Completed),
            "blocked" => Ok(Progress::Blocked),
            _ => Err(MemoryError::InvalidProgress(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// PatternType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternType {
    ApiPatterns,
    ErrorHandling,
    UiPatterns,
    DatabasePatterns,
}

impl PatternType {
    pub fn all() -> &'static [PatternType] {
        &[
            PatternType::ApiPatterns,
            PatternType::ErrorHandling,
            PatternType::UiPatterns,
            PatternType::DatabasePatterns,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PatternType::ApiPatterns => "api-patterns",
            PatternType::ErrorHandling => "error-handling",
            PatternType::UiPatterns => "ui-patterns",
            PatternType::DatabasePatterns => "database-patterns",
        }
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PatternType {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "api-patterns" => Ok(PatternType::ApiPatterns),
            "error-handling" => Ok(PatternType::ErrorHandling),
            "ui-patterns" => Ok(PatternType::UiPatterns),
            "database-patterns" => Ok(PatternType::DatabasePatterns),
            _ => Err(MemoryError::InvalidPatternType(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_action_roundtrip_via_str() {
        for action in ChangeAction::all() {
            let parsed: ChangeAction = action.as_str().parse().unwrap();
            assert_eq!(parsed, *action);
        }
    }

    #[test]
    fn change_action_aliases() {
        assert_eq!("create".parse::<ChangeAction>().unwrap(), ChangeAction::Created);
        assert_eq!(
            "update".parse::<ChangeAction>().unwrap(),
            ChangeAction::CreatedUpdated
        );
        assert_eq!("MODIFY".parse::<ChangeAction>().unwrap(), ChangeAction::Modified);
        assert_eq!("commit".parse::<ChangeAction>().unwrap(), ChangeAction::Committed);
    }

    #[test]
    fn change_action_unknown_is_validation_error() {
        let err = "renamed".parse::<ChangeAction>().unwrap_err();
        assert!(matches!(err, MemoryError::InvalidAction(ref a) if a == "renamed"));
    }

    #[test]
    fn change_action_serializes_like_display() {
        let json = serde_json::to_string(&ChangeAction::CreatedUpdated).unwrap();
        assert_eq!(json, "\"created/updated\"");
        let json = serde_json::to_string(&ChangeAction::BashCommand).unwrap();
        assert_eq!(json, "\"bash_command\"");
    }

    #[test]
    fn progress_parse() {
        assert_eq!("in_progress".parse::<Progress>().unwrap(), Progress::InProgress);
        assert!("done".parse::<Progress>().is_err());
        assert_eq!(Progress::default(), Progress::NotStarted);
    }

    #[test]
    fn pattern_type_parse_and_serde() {
        for t in PatternType::all() {
            assert_eq!(t.as_str().parse::<PatternType>().unwrap(), *t);
            let json = serde_json::to_string(t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.as_str()));
        }
        assert!(matches!(
            "misc-patterns".parse::<PatternType>(),
            Err(MemoryError::InvalidPatternType(_))
        ));
    }
}

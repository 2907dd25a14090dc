use thiserror::Error;

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("no active session")]
    SessionNotFound,

    #[error("session already active: {0}")]
    SessionExists(String),

    #[error("archive not found: {0}")]
    ArchiveNotFound(String),

    #[error("pattern '{key}' not found in {pattern_type}")]
    PatternNotFound { pattern_type: String, key: String },

    #[error("invalid action '{0}': expected one of created, created/updated, modified, deleted, staged, committed, bash_command, changed")]
    InvalidAction(String),

    #[error("invalid progress '{0}': expected one of not_started, in_progress, completed, blocked")]
    InvalidProgress(String),

    #[error("invalid pattern type '{0}': expected one of api-patterns, error-handling, ui-patterns, database-patterns")]
    InvalidPatternType(String),

    #[error("invalid session id '{0}': expected YYYY-MM-DD-<morning|afternoon|evening>")]
    InvalidSessionId(String),

    #[error("pattern key must not be empty")]
    EmptyPatternKey,

    #[error("pattern needs at least one of pattern, description, example, usage")]
    EmptyPattern,

    #[error("invalid tech stack field '{0}'")]
    InvalidTechStackField(String),

    #[error("tech stack update has no fields")]
    EmptyTechStackUpdate,

    #[error(
        "invalid session_ttl_hours {0}: expected 1 to {max}",
        max = crate::config::MAX_SESSION_TTL_HOURS
    )]
    InvalidSessionTtl(u32),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Coarse classification used by callers to decide between printing a tip
/// and aborting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    Io,
}

impl MemoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MemoryError::SessionNotFound
            | MemoryError::ArchiveNotFound(_)
            | MemoryError::PatternNotFound { .. } => ErrorKind::NotFound,
            MemoryError::InvalidAction(_)
            | MemoryError::InvalidProgress(_)
            | MemoryError::InvalidPatternType(_)
            | MemoryError::InvalidSessionId(_)
            | MemoryError::EmptyPatternKey
            | MemoryError::EmptyPattern
            | MemoryError::InvalidTechStackField(_)
            | MemoryError::EmptyTechStackUpdate
            | MemoryError::InvalidSessionTtl(_) => ErrorKind::Validation,
            MemoryError::SessionExists(_) => ErrorKind::Conflict,
            MemoryError::Io(_) | MemoryError::Yaml(_) | MemoryError::Json(_) => ErrorKind::Io,
        }
    }

    /// Not-found, validation and conflict errors can be reported with a tip;
    /// storage failures cannot.
    pub fn is_recoverable(&self) -> bool {
        self.kind() != ErrorKind::Io
    }
}

pub type Result<T> = std::result::Result<T, MemoryError>;

use crate::error::{MemoryError, Result};
use crate::types::PatternType;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const MEMORY_DIR: &str = ".claude-memory";
pub const SESSION_DIR: &str = ".claude-memory/session";
pub const ARCHIVE_DIR: &str = ".claude-memory/session/archive";
pub const PATTERNS_DIR: &str = ".claude-memory/patterns";

pub const CURRENT_SESSION_FILE: &str = ".claude-memory/session/current.json";
pub const TECHSTACK_FILE: &str = ".claude-memory/techstack.json";
pub const CONFIG_FILE: &str = ".claude-memory/config.yaml";
pub const GITIGNORE_FILE: &str = ".claude-memory/.gitignore";

pub const GIT_DIR: &str = ".git";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn memory_dir(root: &Path) -> PathBuf {
    root.join(MEMORY_DIR)
}

pub fn session_dir(root: &Path) -> PathBuf {
    root.join(SESSION_DIR)
}

pub fn archive_dir(root: &Path) -> PathBuf {
    root.join(ARCHIVE_DIR)
}

pub fn patterns_dir(root: &Path) -> PathBuf {
    root.join(PATTERNS_DIR)
}

pub fn current_session_path(root: &Path) -> PathBuf {
    root.join(CURRENT_SESSION_FILE)
}

pub fn archive_path(root: &Path, session_id: &str) -> PathBuf {
    archive_dir(root).join(format!("{session_id}.json"))
}

pub fn patterns_path(root: &Path, pattern_type: PatternType) -> PathBuf {
    patterns_dir(root).join(format!("{}.json", pattern_type.as_str()))
}

pub fn techstack_path(root: &Path) -> PathBuf {
    root.join(TECHSTACK_FILE)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn gitignore_path(root: &Path) -> PathBuf {
    root.join(GITIGNORE_FILE)
}

/// Resolve `file` against `root` unless it is already absolute.
pub fn to_absolute(root: &Path, file: &Path) -> PathBuf {
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        root.join(file)
    }
}

/// Render `file` relative to `root` as `./rel/path` for display.
pub fn display_relative(root: &Path, file: &str) -> String {
    match Path::new(file).strip_prefix(root) {
        Ok(rel) => format!("./{}", rel.display()),
        Err(_) => file.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Session id validation
// ---------------------------------------------------------------------------

static SESSION_ID_RE: OnceLock<Regex> = OnceLock::new();

fn session_id_re() -> &'static Regex {
    SESSION_ID_RE.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2}-(morning|afternoon|evening)$").unwrap()
    })
}

pub fn is_valid_session_id(id: &str) -> bool {
    session_id_re().is_match(id)
}

/// Session ids double as archive file names, so anything that could escape
/// the archive directory is rejected here.
pub fn validate_session_id(id: &str) -> Result<()> {
    if !is_valid_session_id(id) {
        return Err(MemoryError::InvalidSessionId(id.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_session_ids() {
        for id in [
            "2024-01-01-morning",
            "2024-12-31-afternoon",
            "1999-06-15-evening",
        ] {
            validate_session_id(id).unwrap_or_else(|_| panic!("expected valid: {id}"));
        }
    }

    #[test]
    fn invalid_session_ids() {
        for id in [
            "",
            "2024-01-01",
            "2024-01-01-night",
            "24-01-01-morning",
            "../2024-01-01-morning",
            "2024-01-01-morning.json",
        ] {
            assert!(validate_session_id(id).is_err(), "expected invalid: {id}");
        }
    }

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            current_session_path(root),
            PathBuf::from("/tmp/proj/.claude-memory/session/current.json")
        );
        assert_eq!(
            archive_path(root, "2024-01-01-morning"),
            PathBuf::from("/tmp/proj/.claude-memory/session/archive/2024-01-01-morning.json")
        );
        assert_eq!(
            patterns_path(root, PatternType::ErrorHandling),
            PathBuf::from("/tmp/proj/.claude-memory/patterns/error-handling.json")
        );
    }

    #[test]
    fn relative_paths_resolve_against_root() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            to_absolute(root, Path::new("src/main.rs")),
            PathBuf::from("/tmp/proj/src/main.rs")
        );
        assert_eq!(
            to_absolute(root, Path::new("/etc/hosts")),
            PathBuf::from("/etc/hosts")
        );
        assert_eq!(display_relative(root, "/tmp/proj/src/main.rs"), "./src/main.rs");
        assert_eq!(display_relative(root, "/elsewhere/x.rs"), "/elsewhere/x.rs");
    }
}

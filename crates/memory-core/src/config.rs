use crate::error::{MemoryError, Result};
use crate::paths;
use chrono::{Duration, FixedOffset, Local, Offset};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// What `create_session` does when an unexpired session already occupies the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreatePolicy {
    /// Return the existing session unchanged.
    #[default]
    Reuse,
    /// Fail with `SessionExists`.
    Strict,
    /// Archive the existing session, then start a fresh one.
    Replace,
}

/// Which earlier notes an incoming note is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteDedup {
    #[default]
    Latest,
    Any,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Longest session lifetime accepted from `config.yaml`: one year.
pub const MAX_SESSION_TTL_HOURS: u32 = 24 * 365;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_ttl_hours")]
    pub session_ttl_hours: u32,
    #[serde(default)]
    pub create_policy: CreatePolicy,
    #[serde(default = "default_auto_create")]
    pub auto_create_session: bool,
    #[serde(default)]
    pub note_dedup: NoteDedup,
    /// Offset for the session-id time-of-day bucket. Unset means the local offset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc_offset_minutes: Option<i32>,
}

fn default_version() -> u32 {
    1
}

fn default_ttl_hours() -> u32 {
    24
}

fn default_auto_create() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            session_ttl_hours: default_ttl_hours(),
            create_policy: CreatePolicy::default(),
            auto_create_session: default_auto_create(),
            note_dedup: NoteDedup::default(),
            utc_offset_minutes: None,
        }
    }
}

impl Config {
    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Load `.claude-memory/config.yaml`, falling back to defaults when absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        cfg.check_ttl()?;
        Ok(cfg)
    }

    fn check_ttl(&self) -> Result<()> {
        if self.session_ttl_hours == 0 || self.session_ttl_hours > MAX_SESSION_TTL_HOURS {
            return Err(MemoryError::InvalidSessionTtl(self.session_ttl_hours));
        }
        Ok(())
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Derived values
    // -----------------------------------------------------------------------

    pub fn session_ttl(&self) -> Duration {
        Duration::hours(i64::from(self.session_ttl_hours))
    }

    pub fn offset(&self) -> FixedOffset {
        self.utc_offset_minutes
            .and_then(|m| FixedOffset::east_opt(m.saturating_mul(60)))
            .unwrap_or_else(|| Local::now().offset().fix())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.session_ttl_hours == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "session_ttl_hours is 0: every session expires immediately".to_string(),
            });
        } else if self.session_ttl_hours > MAX_SESSION_TTL_HOURS {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "session_ttl_hours is {}: the limit is {MAX_SESSION_TTL_HOURS}",
                    self.session_ttl_hours
                ),
            });
        } else if self.session_ttl_hours > 24 * 7 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "session_ttl_hours is {}: sessions will span several days",
                    self.session_ttl_hours
                ),
            });
        }

        if let Some(m) = self.utc_offset_minutes {
            if FixedOffset::east_opt(m.saturating_mul(60)).is_none() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "utc_offset_minutes {m} is out of range; using the local offset"
                    ),
                });
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg.session_ttl_hours, 24);
        assert_eq!(cfg.create_policy, CreatePolicy::Reuse);
        assert!(cfg.auto_create_session);
        assert_eq!(cfg.note_dedup, NoteDedup::Latest);
    }

    #[test]
    fn roundtrip() {
        let dir = TempDir::new().unwrap();
        let cfg = Config {
            create_policy: CreatePolicy::Strict,
            utc_offset_minutes: Some(540),
            ..Config::default()
        };
        cfg.save(dir.path()).unwrap();

        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.create_policy, CreatePolicy::Strict);
        assert_eq!(loaded.offset(), FixedOffset::east_opt(540 * 60).unwrap());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".claude-memory")).unwrap();
        std::fs::write(
            dir.path().join(".claude-memory/config.yaml"),
            "note_dedup: any\n",
        )
        .unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg.note_dedup, NoteDedup::Any);
        assert_eq!(cfg.session_ttl_hours, 24);
    }

    fn write_config(dir: &TempDir, body: &str) {
        std::fs::create_dir_all(dir.path().join(".claude-memory")).unwrap();
        std::fs::write(dir.path().join(".claude-memory/config.yaml"), body).unwrap();
    }

    #[test]
    fn load_rejects_out_of_range_ttl() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, "session_ttl_hours: 0\n");
        assert!(matches!(
            Config::load(dir.path()),
            Err(MemoryError::InvalidSessionTtl(0))
        ));

        write_config(&dir, "session_ttl_hours: 4294967295\n");
        assert!(matches!(
            Config::load(dir.path()),
            Err(MemoryError::InvalidSessionTtl(u32::MAX))
        ));

        write_config(&dir, &format!("session_ttl_hours: {MAX_SESSION_TTL_HOURS}\n"));
        assert_eq!(
            Config::load(dir.path()).unwrap().session_ttl_hours,
            MAX_SESSION_TTL_HOURS
        );
    }

    #[test]
    fn zero_ttl_is_flagged() {
        let cfg = Config {
            session_ttl_hours: 0,
            ..Config::default()
        };
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].level, WarnLevel::Error);
        assert!(Config::default().validate().is_empty());
    }
}

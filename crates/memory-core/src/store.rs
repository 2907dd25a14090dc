//! The single entry point scripts and hooks talk to.
//!
//! A `MemoryStore` is cheap to build and holds no session state of its own:
//! each call reads the current documents from disk and writes them back.

use crate::archive::{ArchiveManager, ArchiveResult, CleanResult};
use crate::clock::{Clock, SystemClock};
use crate::config::{Config, CreatePolicy};
use crate::error::Result;
use crate::manager::{RecordedChange, SessionManager, UpdateResult};
use crate::paths;
use crate::pattern::{PatternData, PatternLibrary, PatternMap, PatternRecord};
use crate::repository::{FsSessionRepository, SessionRepository};
use crate::session::Session;
use crate::techstack::{TechStack, TechStackRegistry};
use crate::types::{ChangeAction, PatternType};
use crate::update::SessionUpdate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const GITIGNORE_BODY: &str = "# Per-developer session state\nsession/\n";

#[derive(Debug, Clone, Serialize)]
pub struct InitReport {
    pub root: PathBuf,
    /// Directories and files that did not exist before this call.
    pub created: Vec<PathBuf>,
    pub cleaned: CleanResult,
}

pub struct MemoryStore<R: SessionRepository = FsSessionRepository> {
    root: PathBuf,
    repo: R,
    config: Config,
    clock: Arc<dyn Clock>,
}

impl MemoryStore<FsSessionRepository> {
    /// Open the store rooted at `root`, reading `.claude-memory/config.yaml` if present.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let config = Config::load(&root)?;
        Ok(Self::with_clock(root, config, Arc::new(SystemClock)))
    }

    pub fn with_clock(root: impl Into<PathBuf>, config: Config, clock: Arc<dyn Clock>) -> Self {
        let root = root.into();
        let repo = FsSessionRepository::new(root.clone());
        Self::with_repository(root, repo, config, clock)
    }
}

impl<R: SessionRepository> MemoryStore<R> {
    pub fn with_repository(
        root: impl Into<PathBuf>,
        repo: R,
        config: Config,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            root: root.into(),
            repo,
            config,
            clock,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    // -----------------------------------------------------------------------
    // Components
    // -----------------------------------------------------------------------

    pub fn sessions(&self) -> SessionManager<'_, R> {
        SessionManager::new(&self.repo, self.clock.as_ref(), &self.config)
    }

    pub fn archives(&self) -> ArchiveManager<'_, R> {
        ArchiveManager::new(&self.repo, self.clock.as_ref())
    }

    pub fn patterns(&self) -> PatternLibrary<'_> {
        PatternLibrary::new(&self.root, self.clock.as_ref())
    }

    pub fn tech_stack(&self) -> TechStackRegistry<'_> {
        TechStackRegistry::new(&self.root, self.clock.as_ref())
    }

    // -----------------------------------------------------------------------
    // Initialization
    // -----------------------------------------------------------------------

    /// Create the directory layout if needed, then archive an expired session.
    /// Safe to call on every invocation.
    pub fn initialize(&self) -> Result<InitReport> {
        let mut created = Vec::new();

        for dir in [
            paths::memory_dir(&self.root),
            paths::session_dir(&self.root),
            paths::archive_dir(&self.root),
            paths::patterns_dir(&self.root),
        ] {
            if !dir.is_dir() {
                crate::io::ensure_dir(&dir)?;
                created.push(dir);
            }
        }

        let gitignore = paths::gitignore_path(&self.root);
        if crate::io::write_if_missing(&gitignore, GITIGNORE_BODY.as_bytes())? {
            created.push(gitignore);
        }

        let config_path = paths::config_path(&self.root);
        if !config_path.exists() {
            self.config.save(&self.root)?;
            created.push(config_path);
        }

        let cleaned = self.clean_expired()?;
        if !created.is_empty() {
            info!(root = %self.root.display(), created = created.len(), "memory store initialized");
        } else {
            debug!(root = %self.root.display(), "memory store already initialized");
        }

        Ok(InitReport {
            root: self.root.clone(),
            created,
            cleaned,
        })
    }

    // -----------------------------------------------------------------------
    // Sessions
    // -----------------------------------------------------------------------

    pub fn get_current_session(&self) -> Result<Option<Session>> {
        self.sessions().get_current_session()
    }

    pub fn create_session(&self) -> Result<Session> {
        self.sessions().create_session()
    }

    pub fn create_session_with(&self, policy: CreatePolicy) -> Result<Session> {
        self.sessions().create_session_with(policy)
    }

    pub fn update_session(&self, updates: Vec<SessionUpdate>) -> Result<UpdateResult> {
        self.sessions().update_session(updates)
    }

    /// Record a change to `file`; relative paths are resolved against the project root.
    pub fn record_change(
        &self,
        file: impl AsRef<Path>,
        action: ChangeAction,
        description: &str,
    ) -> Result<RecordedChange> {
        let file = self.absolute(file.as_ref());
        self.sessions().record_change(&file, action, description)
    }

    pub fn add_note(&self, text: &str) -> Result<bool> {
        self.sessions().add_note(text)
    }

    pub fn add_bug(&self, text: &str) -> Result<bool> {
        self.sessions().add_bug(text)
    }

    pub fn remove_bug(&self, text: &str) -> Result<bool> {
        self.sessions().remove_bug(text)
    }

    /// Absolute path string for `file` as stored in session documents.
    pub fn absolute(&self, file: &Path) -> String {
        paths::to_absolute(&self.root, file)
            .to_string_lossy()
            .into_owned()
    }

    // -----------------------------------------------------------------------
    // Archive
    // -----------------------------------------------------------------------

    pub fn archive_session(&self) -> Result<ArchiveResult> {
        self.archives().archive_session()
    }

    pub fn clean_expired(&self) -> Result<CleanResult> {
        self.archives().clean_expired()
    }

    pub fn get_archive(&self, session_id: &str) -> Result<Session> {
        self.archives().get_archive(session_id)
    }

    pub fn list_archives(&self) -> Result<Vec<String>> {
        self.archives().list_archives()
    }

    // -----------------------------------------------------------------------
    // Patterns and tech stack
    // -----------------------------------------------------------------------

    pub fn learn_pattern(
        &self,
        pattern_type: PatternType,
        key: &str,
        data: PatternData,
    ) -> Result<PatternRecord> {
        self.patterns().learn_pattern(pattern_type, key, data)
    }

    pub fn get_patterns(&self, pattern_type: PatternType) -> Result<PatternMap> {
        self.patterns().get_patterns(pattern_type)
    }

    pub fn get_pattern(&self, pattern_type: PatternType, key: &str) -> Result<PatternRecord> {
        self.patterns().get_pattern(pattern_type, key)
    }

    pub fn all_patterns(&self) -> Result<Vec<(PatternType, PatternMap)>> {
        self.patterns().all_patterns()
    }

    pub fn get_tech_stack(&self) -> Result<Option<TechStack>> {
        self.tech_stack().get_tech_stack()
    }

    pub fn update_tech_stack(&self, fields: BTreeMap<String, String>) -> Result<TechStack> {
        self.tech_stack().update_tech_stack(fields)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

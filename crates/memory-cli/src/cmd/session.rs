use crate::cmd::open_store;
use crate::output::{print_heading, print_json, print_section, print_table};
use anyhow::Context;
use clap::{Subcommand, ValueEnum};
use memory_core::{
    config::CreatePolicy,
    paths,
    session::{Session, RECENT_CHANGES_CAPACITY},
    time::{format_date, format_duration, format_expiry, format_relative, truncate},
    types::Progress,
    update::{BugOp, NoteAppend, SessionUpdate, TaskUpdate},
    MemoryError, MemoryStore,
};
use std::path::Path;

#[derive(Subcommand)]
pub enum SessionSubcommand {
    /// Show the current session
    Show,
    /// Start a session (by default returns the active one if it has not expired)
    New {
        /// What to do when a session is already active
        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,
    },
    /// Update the current task, notes, or bugs
    Update {
        /// Feature being worked on
        #[arg(long)]
        feature: Option<String>,
        /// not_started, in_progress, completed, blocked
        #[arg(long)]
        progress: Option<String>,
        /// Add a context note
        #[arg(long)]
        note: Option<String>,
        /// Add a next step
        #[arg(long)]
        next_step: Option<String>,
        /// Remove all next steps (applied before --next-step)
        #[arg(long)]
        clear_steps: bool,
        /// Track a file under the current task
        #[arg(long = "file")]
        files: Vec<String>,
        /// Record an active bug
        #[arg(long)]
        add_bug: Option<String>,
        /// Resolve an active bug (exact text)
        #[arg(long)]
        remove_bug: Option<String>,
    },
    /// Archive the current session and clear the active slot
    Archive,
    /// List archived session ids
    Archives,
    /// Show an archived session
    Archived { session_id: String },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum PolicyArg {
    Reuse,
    Strict,
    Replace,
}

impl From<PolicyArg> for CreatePolicy {
    fn from(p: PolicyArg) -> Self {
        match p {
            PolicyArg::Reuse => CreatePolicy::Reuse,
            PolicyArg::Strict => CreatePolicy::Strict,
            PolicyArg::Replace => CreatePolicy::Replace,
        }
    }
}

pub fn run(root: &Path, subcmd: SessionSubcommand, json: bool) -> anyhow::Result<()> {
    let store = open_store(root)?;
    match subcmd {
        SessionSubcommand::Show => show(&store, json),
        SessionSubcommand::New { policy } => new(&store, policy, json),
        SessionSubcommand::Update {
            feature,
            progress,
            note,
            next_step,
            clear_steps,
            files,
            add_bug,
            remove_bug,
        } => {
            let updates = build_updates(
                &store,
                feature,
                progress.as_deref(),
                note,
                next_step,
                clear_steps,
                &files,
                add_bug,
                remove_bug,
            )?;
            update(&store, updates, json)
        }
        SessionSubcommand::Archive => archive(&store, json),
        SessionSubcommand::Archives => archives(&store, json),
        SessionSubcommand::Archived { session_id } => archived(&store, &session_id, json),
    }
}

fn show(store: &MemoryStore, json: bool) -> anyhow::Result<()> {
    let session = store
        .get_current_session()?
        .ok_or(MemoryError::SessionNotFound)?;
    let now = store.now();

    if json {
        return print_json(&serde_json::json!({
            "session": session,
            "summary": {
                "sessionId": session.session_id,
                "duration": format_duration(session.elapsed(now)),
                "filesTracked": session.current_task.files.len(),
                "changesRecorded": session.recent_changes.len(),
                "notesCount": session.context_notes.len(),
            },
        }));
    }

    print_summary(store, &session, "Current Session");
    Ok(())
}

fn new(store: &MemoryStore, policy: Option<PolicyArg>, json: bool) -> anyhow::Result<()> {
    let before = store.get_current_session()?;
    let session = match policy {
        Some(p) => store.create_session_with(p.into())?,
        None => store.create_session()?,
    };
    let reused = before
        .as_ref()
        .is_some_and(|b| b.session_id == session.session_id && b.started_at == session.started_at);

    if json {
        return print_json(&serde_json::json!({ "reused": reused, "session": session }));
    }
    if reused {
        println!("Session already active: {}", session.session_id);
    } else {
        println!("Started session: {}", session.session_id);
    }
    println!(
        "Expires: {}",
        format_date(session.expires_at, store.config().offset())
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn build_updates(
    store: &MemoryStore,
    feature: Option<String>,
    progress: Option<&str>,
    note: Option<String>,
    next_step: Option<String>,
    clear_steps: bool,
    files: &[String],
    add_bug: Option<String>,
    remove_bug: Option<String>,
) -> anyhow::Result<Vec<SessionUpdate>> {
    let progress = progress
        .map(str::parse::<Progress>)
        .transpose()
        .context("invalid --progress")?;

    let task = TaskUpdate {
        feature: feature.map(Some),
        progress,
        add_files: files.iter().map(|f| store.absolute(Path::new(f))).collect(),
        add_next_step: next_step,
        clear_next_steps: clear_steps,
    };

    let mut updates = Vec::new();
    if !task.is_empty() {
        updates.push(SessionUpdate::Task(task));
    }
    if let Some(text) = note {
        if text.trim().is_empty() {
            anyhow::bail!("note is empty: --note needs some text");
        }
        updates.push(SessionUpdate::AppendNote(NoteAppend { text }));
    }
    if let Some(bug) = add_bug {
        updates.push(SessionUpdate::Bug(BugOp::Add(bug)));
    }
    if let Some(bug) = remove_bug {
        updates.push(SessionUpdate::Bug(BugOp::Remove(bug)));
    }

    if updates.is_empty() {
        anyhow::bail!(
            "nothing to update: pass at least one of --feature, --progress, --note, \
             --next-step, --clear-steps, --file, --add-bug, --remove-bug"
        );
    }
    Ok(updates)
}

fn update(store: &MemoryStore, updates: Vec<SessionUpdate>, json: bool) -> anyhow::Result<()> {
    let result = store
        .update_session(updates)
        .context("failed to update session")?;

    if json {
        return print_json(&result);
    }
    println!("Session updated: {}", result.session.session_id);
    for outcome in &result.outcomes {
        println!("  {outcome}");
    }
    Ok(())
}

fn archive(store: &MemoryStore, json: bool) -> anyhow::Result<()> {
    let result = store.archive_session()?;

    if json {
        return print_json(&result);
    }
    let file = result
        .archive_file
        .strip_prefix(store.root())
        .unwrap_or(&result.archive_file);
    println!("Archived session {} to {}", result.session_id, file.display());
    Ok(())
}

const FEATURE_COLUMN_WIDTH: usize = 40;

fn archives(store: &MemoryStore, json: bool) -> anyhow::Result<()> {
    let ids = store.list_archives()?;

    if json {
        return print_json(&ids);
    }
    if ids.is_empty() {
        println!("No archived sessions.");
        return Ok(());
    }

    let offset = store.config().offset();
    let mut rows = Vec::with_capacity(ids.len());
    for id in &ids {
        let session = store
            .get_archive(id)
            .with_context(|| format!("failed to read archive '{id}'"))?;
        rows.push(vec![
            id.clone(),
            format_date(session.started_at, offset),
            session
                .current_task
                .feature
                .map_or_else(|| "-".into(), |f| truncate(&f, FEATURE_COLUMN_WIDTH)),
            session.recent_changes.len().to_string(),
        ]);
    }
    print_table(&["SESSION", "STARTED", "FEATURE", "CHANGES"], rows);
    Ok(())
}

fn archived(store: &MemoryStore, session_id: &str, json: bool) -> anyhow::Result<()> {
    let session = store.get_archive(session_id)?;

    if json {
        return print_json(&session);
    }
    print_summary(store, &session, "Archived Session");
    Ok(())
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn print_summary(store: &MemoryStore, session: &Session, title: &str) {
    let now = store.now();
    let offset = store.config().offset();
    let root = store.root();

    println!();
    print_heading(title);
    println!();
    println!("Session ID:      {}", session.session_id);
    println!(
        "Started:         {} ({})",
        format_date(session.started_at, offset),
        format_relative(session.started_at, now)
    );
    println!(
        "Duration:        {}",
        format_duration(session.elapsed(now))
    );
    println!(
        "Expires:         {} ({})",
        format_date(session.expires_at, offset),
        format_expiry(session.expires_at, now)
    );

    let task = &session.current_task;
    print_section("Current Task");
    match &task.feature {
        Some(feature) => {
            println!("Feature:         {feature}");
            println!("Progress:        {}", task.progress);
        }
        None => println!("No current task set"),
    }
    if !task.files.is_empty() {
        println!("\nFiles ({}):", task.files.len());
        for (i, file) in task.files.iter().enumerate() {
            println!("  {}. {}", i + 1, paths::display_relative(root, file));
        }
    }
    if !task.next_steps.is_empty() {
        println!("\nNext Steps ({}):", task.next_steps.len());
        for (i, step) in task.next_steps.iter().enumerate() {
            println!("  {}. {step}", i + 1);
        }
    }

    if !session.active_bugs.is_empty() {
        print_section("Active Bugs");
        for (i, bug) in session.active_bugs.iter().enumerate() {
            println!("  {}. {bug}", i + 1);
        }
    }

    print_section(&format!(
        "Recent Changes ({}/{RECENT_CHANGES_CAPACITY})",
        session.recent_changes.len()
    ));
    if session.recent_changes.is_empty() {
        println!("No changes recorded yet");
    }
    for (file, changes) in session.changes_by_file() {
        println!("\n{}", paths::display_relative(root, file));
        for change in changes {
            println!(
                "  • {:<15} {}",
                change.action.as_str(),
                format_relative(change.timestamp, now)
            );
        }
    }

    if !session.context_notes.is_empty() {
        print_section(&format!("Context Notes ({})", session.context_notes.len()));
        for (i, note) in session.context_notes.iter().enumerate() {
            println!("  {}. {note}", i + 1);
        }
    }
    println!();
}

//! Assistant hooks. The payload arrives on stdin as JSON: tool hooks read
//! `tool_name` and `tool_input`, the prompt hook reads `prompt`. A hook must
//! never break the assistant's turn, so every failure is logged and the
//! process still exits 0.

use crate::cmd::open_store;
use crate::output::print_json;
use clap::Subcommand;
use memory_core::{
    session::{Session, RECENT_CHANGES_CAPACITY},
    types::{ChangeAction, Progress},
    MemoryStore,
};
use regex::{Regex, RegexSet};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, warn};

#[derive(Subcommand)]
pub enum HookSubcommand {
    /// Record the file touched by a Write, Edit, or Bash tool call
    PostToolUse,
    /// Print a memory-update reminder before `git add`
    PreToolUse,
    /// Print a documentation reminder when the prompt sounds like the end of the work
    UserPromptSubmit,
}

#[derive(Debug, Deserialize)]
struct HookPayload {
    #[serde(default)]
    tool_name: String,
    #[serde(default)]
    tool_input: ToolInput,
    #[serde(default)]
    prompt: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ToolInput {
    file_path: Option<String>,
    command: Option<String>,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum HookOutcome {
    Tracked { file: String, action: ChangeAction },
    Reminded { session_id: Option<String> },
    DocsReminded { session_id: String, changes_count: usize },
    Skipped { reason: &'static str },
    Failed { error: String },
}

pub fn run(root: &Path, subcmd: HookSubcommand, json: bool) -> anyhow::Result<()> {
    let outcome = match read_payload() {
        Ok(payload) => match subcmd {
            HookSubcommand::PostToolUse => post_tool_use(root, &payload),
            HookSubcommand::PreToolUse => pre_tool_use(root, &payload),
            HookSubcommand::UserPromptSubmit => user_prompt_submit(root, &payload),
        },
        Err(e) => HookOutcome::Failed {
            error: format!("{e:#}"),
        },
    };

    match &outcome {
        HookOutcome::Failed { error } => warn!(%error, "hook failed"),
        other => debug!(outcome = ?other, "hook finished"),
    }
    if json {
        print_json(&outcome)?;
    }
    Ok(())
}

fn read_payload() -> anyhow::Result<HookPayload> {
    let mut raw = String::new();
    std::io::stdin().read_to_string(&mut raw)?;
    Ok(serde_json::from_str(&raw)?)
}

// ---------------------------------------------------------------------------
// post-tool-use
// ---------------------------------------------------------------------------

fn post_tool_use(root: &Path, payload: &HookPayload) -> HookOutcome {
    let (file, action) = match classify(payload) {
        Ok(hit) => hit,
        Err(reason) => return HookOutcome::Skipped { reason },
    };
    let description = format!("{}: {action}", payload.tool_name);

    let recorded = open_store(root).and_then(|store| {
        store
            .record_change(&file, action, &description)
            .map_err(anyhow::Error::from)
    });
    match recorded {
        Ok(r) => HookOutcome::Tracked {
            file: r.change.file,
            action,
        },
        Err(e) => HookOutcome::Failed {
            error: format!("{e:#}"),
        },
    }
}

/// Which file a tool call touched and how, or why it is not tracked.
fn classify(payload: &HookPayload) -> Result<(String, ChangeAction), &'static str> {
    let input = &payload.tool_input;
    match payload.tool_name.as_str() {
        "Write" | "Edit" => {
            let action = if payload.tool_name == "Write" {
                ChangeAction::CreatedUpdated
            } else {
                ChangeAction::Modified
            };
            let file = input.file_path.clone().ok_or("no_file_path")?;
            Ok((file, action))
        }
        "Bash" => {
            let command = input.command.as_deref().unwrap_or("");
            let file = bash_target(command).ok_or("no_file_path")?;
            Ok((file.to_string(), bash_action(command)))
        }
        _ => Err("tool_not_tracked"),
    }
}

fn bash_action(command: &str) -> ChangeAction {
    if command.contains("git commit") {
        ChangeAction::Committed
    } else if command.contains("git add") {
        ChangeAction::Staged
    } else if command.contains("rm ") {
        ChangeAction::Deleted
    } else {
        ChangeAction::BashCommand
    }
}

static BASH_TARGET_RE: OnceLock<Regex> = OnceLock::new();

fn bash_target(command: &str) -> Option<&str> {
    let re = BASH_TARGET_RE.get_or_init(|| {
        Regex::new(r"(?:touch|vim|nano|rm|mv)\s+([^\s]+)").expect("valid regex")
    });
    re.captures(command)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

// ---------------------------------------------------------------------------
// pre-tool-use
// ---------------------------------------------------------------------------

static GIT_ADD_RE: OnceLock<Regex> = OnceLock::new();

fn git_add_re() -> &'static Regex {
    GIT_ADD_RE.get_or_init(|| Regex::new(r"git\s+add(?:\s+(.+))?").expect("valid regex"))
}

fn pre_tool_use(root: &Path, payload: &HookPayload) -> HookOutcome {
    let command = payload.tool_input.command.as_deref().unwrap_or("");
    if payload.tool_name != "Bash" || !git_add_re().is_match(command) {
        return HookOutcome::Skipped {
            reason: "not_git_add",
        };
    }

    let session = match MemoryStore::open(root).and_then(|s| s.get_current_session()) {
        Ok(session) => session,
        Err(e) => {
            return HookOutcome::Failed {
                error: e.to_string(),
            }
        }
    };
    print!("{}", reminder(session.as_ref(), &staged_files(command)));
    HookOutcome::Reminded {
        session_id: session.map(|s| s.session_id),
    }
}

/// Arguments of the `git add` invocation, stopping at the first shell separator.
fn staged_files(command: &str) -> Vec<&str> {
    let Some(args) = git_add_re().captures(command).and_then(|c| c.get(1)) else {
        return Vec::new();
    };
    args.as_str()
        .split_whitespace()
        .take_while(|t| !matches!(*t, "&&" | "||" | ";" | "|"))
        .collect()
}

fn reminder(session: Option<&Session>, files: &[&str]) -> String {
    let rule = "━".repeat(60);
    let mut out = format!("\n{rule}\nUpdate session memory before staging\n{rule}\n\n");

    match session {
        Some(s) => out.push_str(&format!(
            "1. Session {} ({}/{RECENT_CHANGES_CAPACITY} changes, {} files tracked):\n",
            s.session_id,
            s.recent_changes.len(),
            s.current_task.files.len()
        )),
        None => out.push_str("1. No active session; it is created on the first update:\n"),
    }
    out.push_str("   • record file changes:   memory track <file> --action <action>\n");
    out.push_str("   • set task progress:     memory session update --progress <progress>\n");
    out.push_str("   • note what was done:    memory session update --note \"...\"\n\n");

    if !files.is_empty() {
        out.push_str(&format!("2. Files being staged: {}\n", files.join(", ")));
        out.push_str("   Make sure they are reflected in the session.\n\n");
    }
    if let Some(feature) = session.and_then(|s| s.current_task.feature.as_deref()) {
        out.push_str(&format!(
            "3. Document the work on \"{feature}\" in the session notes.\n\n"
        ));
    }
    out.push_str("Then continue with the git command.\n");
    out.push_str(&rule);
    out.push_str("\n\n");
    out
}

// ---------------------------------------------------------------------------
// user-prompt-submit
// ---------------------------------------------------------------------------

static ENDING_RE: OnceLock<RegexSet> = OnceLock::new();

fn is_ending_prompt(prompt: &str) -> bool {
    let set = ENDING_RE.get_or_init(|| {
        RegexSet::new([
            r"(?i)\b(done|finished|complete|completed)\b",
            r"(?i)\b(goodbye|bye|see you|thanks|thank you)\b",
            r"(?i)\b(commit|push|deploy)\b.*\b(done|finished)\b",
            r"(?i)that'?s? (it|all)",
        ])
        .expect("valid regex")
    });
    set.is_match(prompt)
}

fn user_prompt_submit(root: &Path, payload: &HookPayload) -> HookOutcome {
    let prompt = payload.prompt.as_deref().unwrap_or("");
    if !is_ending_prompt(prompt) {
        return HookOutcome::Skipped {
            reason: "not_ending_prompt",
        };
    }

    let session = match MemoryStore::open(root).and_then(|s| s.get_current_session()) {
        Ok(Some(session)) => session,
        Ok(None) => {
            return HookOutcome::Skipped {
                reason: "no_active_session",
            }
        }
        Err(e) => {
            return HookOutcome::Failed {
                error: e.to_string(),
            }
        }
    };
    let Some(text) = documentation_reminder(&session) else {
        return HookOutcome::Skipped {
            reason: "no_work_to_document",
        };
    };
    print!("{text}");
    HookOutcome::DocsReminded {
        session_id: session.session_id,
        changes_count: session.recent_changes.len(),
    }
}

/// Documentation files worth updating before the session ends, or `None`
/// when nothing has happened in the session yet.
fn documentation_reminder(session: &Session) -> Option<String> {
    let changes = session.recent_changes.len();
    let progress = session.current_task.progress;
    if changes == 0 && progress == Progress::NotStarted {
        return None;
    }

    let mut docs: Vec<(&str, &str)> = Vec::new();
    if progress != Progress::NotStarted || changes > 5 {
        docs.push(("CURRENT.md", "Update current project state"));
        docs.push(("progress.md", "Add session summary with timestamp"));
    }
    if session.current_task.feature.is_some() && progress == Progress::Completed {
        docs.push(("CHANGELOG.md", "Document completed feature"));
    }
    let structural = session
        .recent_changes
        .iter()
        .any(|c| c.file.contains("architecture") || c.file.contains("schema"));
    if structural {
        docs.push(("ARCHITECTURE.md", "Document architectural decisions"));
    }

    let rule = "━".repeat(60);
    let mut out = format!("\n{rule}\nDOCUMENTATION REMINDER\n{rule}\n\n");
    out.push_str("Consider updating these files before ending:\n");
    for (file, why) in &docs {
        out.push_str(&format!("   • {file}: {why}\n"));
    }
    out.push_str(&format!(
        "\nSession {} has {changes}/{RECENT_CHANGES_CAPACITY} changes recorded.\n",
        session.session_id
    ));
    out.push_str("Archive it when the work is wrapped up: memory session archive\n");
    out.push_str(&rule);
    out.push_str("\n\n");
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn payload(tool: &str, file: Option<&str>, command: Option<&str>) -> HookPayload {
        HookPayload {
            tool_name: tool.to_string(),
            tool_input: ToolInput {
                file_path: file.map(str::to_string),
                command: command.map(str::to_string),
            },
            prompt: None,
        }
    }

    fn session() -> Session {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        Session::new("2024-01-01-morning", start, Duration::hours(24))
    }

    #[test]
    fn write_and_edit() {
        assert_eq!(
            classify(&payload("Write", Some("/p/a.ts"), None)),
            Ok(("/p/a.ts".to_string(), ChangeAction::CreatedUpdated))
        );
        assert_eq!(
            classify(&payload("Edit", Some("/p/a.ts"), None)),
            Ok(("/p/a.ts".to_string(), ChangeAction::Modified))
        );
        assert_eq!(
            classify(&payload("Edit", None, None)),
            Err("no_file_path")
        );
    }

    #[test]
    fn bash_commands() {
        assert_eq!(
            classify(&payload("Bash", None, Some("rm src/old.ts"))),
            Ok(("src/old.ts".to_string(), ChangeAction::Deleted))
        );
        assert_eq!(
            classify(&payload("Bash", None, Some("touch notes.md"))),
            Ok(("notes.md".to_string(), ChangeAction::BashCommand))
        );
        assert_eq!(
            classify(&payload("Bash", None, Some("git add . && git commit -m x"))),
            Err("no_file_path")
        );
        assert_eq!(bash_action("git add src"), ChangeAction::Staged);
        assert_eq!(bash_action("git commit -m 'rm x'"), ChangeAction::Committed);
    }

    #[test]
    fn other_tools_are_ignored() {
        assert_eq!(
            classify(&payload("Read", Some("/p/a.ts"), None)),
            Err("tool_not_tracked")
        );
    }

    #[test]
    fn staged_files_stop_at_separator() {
        assert_eq!(
            staged_files("git add src/a.rs src/b.rs && git commit -m wip"),
            vec!["src/a.rs", "src/b.rs"]
        );
        assert!(staged_files("git add").is_empty());
    }

    #[test]
    fn reminder_mentions_session_and_feature() {
        let mut s = session();
        s.current_task.feature = Some("auth".into());
        let text = reminder(Some(&s), &["src/a.rs"]);
        assert!(text.contains("Session 2024-01-01-morning (0/20 changes"));
        assert!(text.contains("Files being staged: src/a.rs"));
        assert!(text.contains("\"auth\""));

        let text = reminder(None, &[]);
        assert!(text.contains("No active session"));
        assert!(!text.contains("Files being staged"));
    }

    #[test]
    fn ending_prompts() {
        assert!(is_ending_prompt("OK, I think we're done"));
        assert!(is_ending_prompt("Thanks!"));
        assert!(is_ending_prompt("that's all for today"));
        assert!(is_ending_prompt("push it, then we're finished"));
        assert!(!is_ending_prompt("add a login page"));
        assert!(!is_ending_prompt("is the build abandoned?"));
        assert!(!is_ending_prompt(""));
    }

    #[test]
    fn docs_reminder_needs_some_work() {
        assert!(documentation_reminder(&session()).is_none());

        let mut s = session();
        s.current_task.progress = Progress::InProgress;
        let text = documentation_reminder(&s).unwrap();
        assert!(text.contains("DOCUMENTATION REMINDER"));
        assert!(text.contains("CURRENT.md"));
        assert!(text.contains("progress.md"));
        assert!(!text.contains("CHANGELOG.md"));
        assert!(!text.contains("ARCHITECTURE.md"));
    }

    #[test]
    fn docs_reminder_lists_changelog_and_architecture() {
        let mut s = session();
        s.current_task.feature = Some("auth".into());
        s.current_task.progress = Progress::Completed;
        s.recent_changes.push(memory_core::session::ChangeRecord {
            file: "/p/db/schema.sql".into(),
            action: ChangeAction::Modified,
            description: "x".into(),
            timestamp: s.started_at,
        });
        let text = documentation_reminder(&s).unwrap();
        assert!(text.contains("CHANGELOG.md: Document completed feature"));
        assert!(text.contains("ARCHITECTURE.md"));
        assert!(text.contains("1/20 changes"));
    }

    #[test]
    fn few_changes_without_progress_skip_project_files() {
        let mut s = session();
        s.recent_changes.push(memory_core::session::ChangeRecord {
            file: "/p/a.rs".into(),
            action: ChangeAction::Modified,
            description: "x".into(),
            timestamp: s.started_at,
        });
        let text = documentation_reminder(&s).unwrap();
        assert!(!text.contains("CURRENT.md"));
    }

    #[test]
    fn prompt_payload_has_no_tool_name() {
        let p: HookPayload = serde_json::from_str(r#"{"prompt":"we're done"}"#).unwrap();
        assert_eq!(p.prompt.as_deref(), Some("we're done"));
        assert!(p.tool_name.is_empty());
    }

    #[test]
    fn payload_tolerates_extra_fields() {
        let raw = r#"{"session_id":"x","tool_name":"Edit","tool_input":{"file_path":"/p/a.ts","old_string":"a"}}"#;
        let p: HookPayload = serde_json::from_str(raw).unwrap();
        assert_eq!(p.tool_input.file_path.as_deref(), Some("/p/a.ts"));
    }
}

use crate::cmd::open_store;
use crate::output::{print_heading, print_json, print_section};
use anyhow::Context;
use clap::Args;
use memory_core::{
    paths,
    session::{action_counts, group_by_file, ChangeRecord, RECENT_CHANGES_CAPACITY},
    time::format_relative,
    types::ChangeAction,
    MemoryError,
};
use std::collections::BTreeSet;
use std::path::Path;

#[derive(Args)]
pub struct ChangesArgs {
    /// Show at most this many changes, oldest first
    #[arg(long, short = 'n')]
    limit: Option<usize>,
    /// Only changes to this file
    #[arg(long, short = 'f')]
    file: Option<String>,
    /// List in recorded order instead of grouping by file
    #[arg(long)]
    chronological: bool,
}

pub fn track(
    root: &Path,
    file: &str,
    action: &str,
    description: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let action: ChangeAction = action.parse()?;
    let store = open_store(root)?;
    let description = match description {
        Some(d) => d.to_string(),
        None => format!("Tracked: {action}"),
    };

    let result = store
        .record_change(file, action, &description)
        .with_context(|| format!("failed to record change to {file}"))?;
    let total_changes = result.total_changes;
    let total_files = result.total_files;

    if json {
        return print_json(&serde_json::json!({
            "recorded": result.recorded,
            "change": result.change,
            "stats": {
                "totalChanges": total_changes,
                "totalFiles": total_files,
            },
        }));
    }

    println!("Change tracked");
    println!(
        "  File:    {}",
        paths::display_relative(store.root(), &result.change.file)
    );
    println!("  Action:  {}", result.change.action);
    println!("  Changes: {total_changes}/{RECENT_CHANGES_CAPACITY}");
    println!("  Files:   {total_files}");
    Ok(())
}

pub fn run(root: &Path, args: ChangesArgs, json: bool) -> anyhow::Result<()> {
    let store = open_store(root)?;
    let session = store
        .get_current_session()?
        .ok_or(MemoryError::SessionNotFound)?;
    let all = &session.recent_changes;

    let filter = args.file.as_deref().map(|f| store.absolute(Path::new(f)));
    let changes: Vec<ChangeRecord> = all
        .iter()
        .filter(|c| filter.as_deref().map_or(true, |f| c.file == f))
        .take(args.limit.unwrap_or(usize::MAX))
        .cloned()
        .collect();

    let counts = action_counts(&changes);
    let unique_files = changes
        .iter()
        .map(|c| c.file.as_str())
        .collect::<BTreeSet<_>>()
        .len();
    let buffer_full = session.is_change_buffer_full();

    if json {
        let counts: serde_json::Map<String, serde_json::Value> = counts
            .iter()
            .map(|(action, n)| (action.to_string(), (*n).into()))
            .collect();
        return print_json(&serde_json::json!({
            "changes": changes,
            "total": changes.len(),
            "stats": {
                "uniqueFiles": unique_files,
                "actionCounts": counts,
                "bufferFull": buffer_full,
            },
        }));
    }

    let now = store.now();
    let root = store.root();

    println!();
    print_heading(&format!("Recent Changes ({}/{})", changes.len(), all.len()));
    if changes.is_empty() {
        println!("\nNo changes recorded yet");
        println!();
        return Ok(());
    }

    if args.chronological {
        println!();
        for (i, change) in changes.iter().enumerate() {
            println!("{}. {}", i + 1, paths::display_relative(root, &change.file));
            println!(
                "   {:<17} {}",
                change.action.as_str(),
                format_relative(change.timestamp, now)
            );
        }
    } else {
        for (file, group) in group_by_file(&changes) {
            println!("\n{}", paths::display_relative(root, file));
            for change in group {
                println!(
                    "  • {:<17} {}",
                    change.action.as_str(),
                    format_relative(change.timestamp, now)
                );
            }
        }
    }

    print_section("Summary");
    println!("\nActions:");
    for (action, n) in &counts {
        println!("  {action}: {n}");
    }
    println!("\nUnique Files: {unique_files}");
    println!("Total Changes: {}", changes.len());
    if buffer_full {
        println!(
            "\nBuffer is full ({RECENT_CHANGES_CAPACITY}/{RECENT_CHANGES_CAPACITY}); older changes have been dropped."
        );
    }
    println!();
    Ok(())
}

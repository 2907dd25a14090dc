use crate::output::print_json;
use anyhow::Context;
use memory_core::{config::WarnLevel, paths, MemoryStore};
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let store = MemoryStore::open(root)
        .with_context(|| format!("failed to read {}", paths::CONFIG_FILE))?;
    let report = store
        .initialize()
        .context("failed to initialize .claude-memory")?;
    let warnings = store.config().validate();

    if json {
        return print_json(&serde_json::json!({
            "root": report.root,
            "created": report.created,
            "cleaned": report.cleaned,
            "warnings": warnings,
        }));
    }

    println!("Initializing memory store in: {}", root.display());
    if report.created.is_empty() {
        println!("  exists:  {}", paths::MEMORY_DIR);
    }
    for path in &report.created {
        let rel = path.strip_prefix(root).unwrap_or(path);
        println!("  created: {}", rel.display());
    }
    if let Some(id) = &report.cleaned.session_id {
        println!("  archived expired session: {id}");
    }
    for w in &warnings {
        let label = match w.level {
            WarnLevel::Warning => "warning",
            WarnLevel::Error => "error",
        };
        println!("  {label}: {}", w.message);
    }
    Ok(())
}

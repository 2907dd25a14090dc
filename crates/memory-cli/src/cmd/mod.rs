pub mod changes;
pub mod hook;
pub mod init;
pub mod pattern;
pub mod session;
pub mod stack;

use anyhow::Context;
use memory_core::MemoryStore;
use std::path::Path;

/// Open the store and bring it up to date: layout present, expired session archived.
pub fn open_store(root: &Path) -> anyhow::Result<MemoryStore> {
    let store = MemoryStore::open(root)
        .with_context(|| format!("failed to open memory store in {}", root.display()))?;
    store
        .initialize()
        .context("failed to initialize .claude-memory")?;
    Ok(store)
}

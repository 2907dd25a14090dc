use memory_core::paths;
use std::path::{Path, PathBuf};

/// Resolve the project root the memory store lives under.
///
/// Priority:
/// 1. `--root` flag / `MEMORY_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.claude-memory/`
/// 3. Walk upward from `cwd` looking for `.git/`
/// 4. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    resolve_from(&cwd)
}

fn resolve_from(start: &Path) -> PathBuf {
    find_upward(start, paths::MEMORY_DIR)
        .or_else(|| find_upward(start, paths::GIT_DIR))
        .unwrap_or_else(|| start.to_path_buf())
}

fn find_upward(start: &Path, marker: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(marker).is_dir())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        assert_eq!(resolve_root(Some(dir.path())), dir.path());
    }

    #[test]
    fn memory_dir_beats_git_dir() {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join("project");
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        std::fs::create_dir_all(project.join(".claude-memory")).unwrap();
        let deep = project.join("src/deep");
        std::fs::create_dir_all(&deep).unwrap();

        assert_eq!(resolve_from(&deep), project);
    }

    #[test]
    fn falls_back_to_git_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        let deep = dir.path().join("a/b");
        std::fs::create_dir_all(&deep).unwrap();

        assert_eq!(resolve_from(&deep), dir.path());
    }
}

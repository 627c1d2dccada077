use std::path::{Path, PathBuf};

fn find_upward(start: &Path, marker: &str) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        if dir.join(marker).is_dir() {
            return Some(dir);
        }
        match dir.parent() {
            Some(p) => dir = p.to_path_buf(),
            None => return None,
        }
    }
}

/// Resolve the project root.
///
/// Priority:
/// 1. `--root` flag / `PRP_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.claude/`
/// 3. Walk upward from `cwd` looking for `.git/`
/// 4. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_upward(&cwd, ".claude")
        .or_else(|| find_upward(&cwd, ".git"))
        .unwrap_or(cwd)
}

/// Like [`resolve_root`], but a hook payload's `cwd` (when it names an
/// existing directory) is used before auto-detection.
pub fn resolve_hook_root(explicit: Option<&Path>, payload_cwd: &str) -> PathBuf {
    if explicit.is_none() && !payload_cwd.is_empty() {
        let cwd = Path::new(payload_cwd);
        if cwd.is_dir() {
            return cwd.to_path_buf();
        }
        tracing::debug!(cwd = payload_cwd, "payload cwd is not a directory");
    }
    resolve_root(explicit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        assert_eq!(resolve_root(Some(dir.path())), dir.path());
        assert_eq!(
            resolve_hook_root(Some(dir.path()), &other.path().to_string_lossy()),
            dir.path()
        );
    }

    #[test]
    fn payload_cwd_used_for_hooks() {
        let dir = TempDir::new().unwrap();
        let cwd = dir.path().to_string_lossy().into_owned();
        assert_eq!(resolve_hook_root(None, &cwd), dir.path());
    }

    #[test]
    fn finds_marker_upward() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".claude")).unwrap();
        let deep = dir.path().join("src/deep");
        std::fs::create_dir_all(&deep).unwrap();
        assert_eq!(find_upward(&deep, ".claude").as_deref(), Some(dir.path()));
        assert_eq!(find_upward(&deep, ".no-such-marker-dir"), None);
    }
}

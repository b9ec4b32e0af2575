use mc_core::paths;
use std::path::{Path, PathBuf};

/// Resolve the project root for commands that act on an existing app.
///
/// Priority:
/// 1. `--root` flag / `MOBILECADDY_ROOT` env var (passed in as `explicit`)
/// 2. Nearest ancestor of `cwd` holding a `package.json`
/// 3. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_upward(&cwd, paths::MANIFEST_FILE).unwrap_or(cwd)
}

/// Directory new projects are created in: `--root` if given, else `cwd`.
/// Never walks upward, so `new` inside an existing app does not nest
/// the new project at that app's root.
pub fn base_dir(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn find_upward(start: &Path, marker: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(marker).is_file())
        .map(Path::to_path_buf)
}

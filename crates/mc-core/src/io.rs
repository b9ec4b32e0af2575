use crate::error::Result;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Atomically write `data` to `path` using a tempfile in the same directory.
/// Prevents partial writes from corrupting the registry or rendered pages.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    // Rewrites of existing files keep their mode; tempfiles start at 0600.
    if let Ok(meta) = std::fs::metadata(path) {
        tmp.as_file().set_permissions(meta.permissions())?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Create a directory and all parents, idempotent.
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)?;
    Ok(())
}

/// Delete `path` (if present) and create it again empty.
pub fn recreate_dir(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_dir_all(path)?;
    }
    std::fs::create_dir_all(path)?;
    Ok(())
}

/// Remove a directory tree if it exists. Returns true if something was removed.
pub fn remove_dir_if_exists(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    std::fs::remove_dir_all(path)?;
    Ok(true)
}

/// Remove a file if it exists. Returns true if something was removed.
pub fn remove_file_if_exists(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    std::fs::remove_file(path)?;
    Ok(true)
}

/// All regular files under `root`, recursively, sorted for stable output.
pub fn walk_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    walk_into(root, &mut files)?;
    files.sort();
    Ok(files)
}

fn walk_into(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            walk_into(&path, out)?;
        } else if file_type.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

/// Recursively copy `src` into `dst`, skipping any entry (file or directory)
/// whose path relative to `src` satisfies `exclude`.
pub fn copy_tree<F>(src: &Path, dst: &Path, exclude: &F) -> Result<u64>
where
    F: Fn(&Path) -> bool,
{
    copy_tree_inner(src, src, dst, exclude)
}

fn copy_tree_inner<F>(base: &Path, dir: &Path, dst: &Path, exclude: &F) -> Result<u64>
where
    F: Fn(&Path) -> bool,
{
    let mut copied = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let rel = path.strip_prefix(base).unwrap_or(&path);
        if exclude(rel) {
            continue;
        }
        let target = dst.join(rel);
        if entry.file_type()?.is_dir() {
            ensure_dir(&target)?;
            copied += copy_tree_inner(base, &path, dst, exclude)?;
        } else {
            if let Some(parent) = target.parent() {
                ensure_dir(parent)?;
            }
            std::fs::copy(&path, &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Literal, case-sensitive replacement of `from` with `to` in every UTF-8
/// file under `root`. Files that are not valid UTF-8 are skipped.
/// Returns the number of files rewritten.
pub fn replace_in_tree(root: &Path, from: &str, to: &str) -> Result<usize> {
    if from.is_empty() {
        return Ok(0);
    }
    let mut changed = 0;
    for file in walk_files(root)? {
        let bytes = std::fs::read(&file)?;
        let Ok(content) = String::from_utf8(bytes) else {
            continue;
        };
        if !content.contains(from) {
            continue;
        }
        atomic_write(&file, content.replace(from, to).as_bytes())?;
        changed += 1;
    }
    Ok(changed)
}

/// Files directly inside `dir` whose name matches `pred`, sorted by name.
/// A missing directory yields an empty list.
pub fn files_in<F>(dir: &Path, pred: F) -> Result<Vec<PathBuf>>
where
    F: Fn(&str) -> bool,
{
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if pred(&name.to_string_lossy()) {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Append text to a file, creating it if it doesn't exist.
pub fn append_text(path: &Path, text: &str) -> Result<()> {
    let mut f = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    f.write_all(text.as_bytes())?;
    Ok(())
}

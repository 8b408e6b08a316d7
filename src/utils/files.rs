//! Project file discovery and pre-fix backups.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use ignore::WalkBuilder;
use std::fs;
use std::path::{Path, PathBuf};

/// `<stem>.backup_<YYYYmmdd_HHMMSS><.ext>` next to `path`.
pub fn backup_path(path: &Path, at: DateTime<Local>) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let name = format!("{stem}.backup_{}{extension}", at.format("%Y%m%d_%H%M%S"));
    path.with_file_name(name)
}

/// Byte-for-byte copy of `path`, returning the backup's location.
pub fn create_backup(path: &Path) -> Result<PathBuf> {
    if !path.is_file() {
        bail!("Cannot back up {}: not a file", path.display());
    }
    let backup = backup_path(path, Local::now());
    fs::copy(path, &backup)
        .with_context(|| format!("Failed to create backup for {}", path.display()))?;
    tracing::debug!("Backed up {} to {}", path.display(), backup.display());
    Ok(backup)
}

/// Python sources under `root`, honoring `.gitignore` and the exclusion
/// patterns (matched against the root-relative path).
pub fn find_python_files(root: &Path, excludes: &[glob::Pattern]) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        bail!("Not a directory: {}", root.display());
    }

    let mut files = Vec::new();
    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .require_git(false)
        .build();

    for entry in walker {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() || !is_python_source(path) {
            continue;
        }
        let relative = path.strip_prefix(root).unwrap_or(path);
        let relative = relative.to_string_lossy().replace('\\', "/");
        if excludes.iter().any(|p| p.matches(&relative)) {
            continue;
        }
        files.push(path.to_path_buf());
    }

    files.sort();
    Ok(files)
}

fn is_python_source(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("py") | Some("pyi")
    )
}

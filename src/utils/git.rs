//! Git queries used by `--changed-only` and `configure --show`.
//!
//! `git2::Repository` is not `Send`, so each query opens its own handle.

use crate::pipeline::relativize;
use anyhow::{Context as _, Result};
use git2::{DiffOptions, Repository, Status, StatusOptions};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub struct GitRepository {
    workdir: PathBuf,
}

impl GitRepository {
    /// Discover the repository containing `path`.
    pub fn discover(path: &Path) -> Result<Self> {
        let repo = Repository::discover(path)
            .with_context(|| format!("Failed to discover git repository at {}", path.display()))?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| anyhow::anyhow!("Bare repositories are not supported"))?;
        let workdir = workdir.canonicalize().unwrap_or_else(|_| workdir.to_path_buf());
        Ok(Self { workdir })
    }

    pub fn root(&self) -> &Path {
        &self.workdir
    }

    fn open_repo(&self) -> Result<Repository> {
        Repository::open(&self.workdir)
            .with_context(|| format!("Failed to open repository at {}", self.workdir.display()))
    }

    /// Files that differ from `base_ref` (default `HEAD`) in the index or
    /// working tree, plus untracked files. Paths are repository-relative.
    pub fn changed_files(&self, base_ref: Option<&str>) -> Result<BTreeSet<PathBuf>> {
        let repo = self.open_repo()?;
        let base_tree = match base_ref {
            Some(reference) => Some(
                repo.revparse_single(reference)
                    .and_then(|object| object.peel_to_tree())
                    .with_context(|| format!("Unknown git reference '{reference}'"))?,
            ),
            None => repo.head().ok().and_then(|head| head.peel_to_tree().ok()),
        };

        let mut options = DiffOptions::new();
        options.include_untracked(true).recurse_untracked_dirs(true);
        let diff = repo
            .diff_tree_to_workdir_with_index(base_tree.as_ref(), Some(&mut options))
            .context("Failed to diff working tree")?;

        Ok(diff
            .deltas()
            .filter_map(|delta| delta.new_file().path().or_else(|| delta.old_file().path()))
            .map(Path::to_path_buf)
            .collect())
    }

    /// Files staged in the index relative to `HEAD`.
    pub fn staged_files(&self) -> Result<BTreeSet<PathBuf>> {
        self.files_with_status(
            Status::INDEX_NEW
                | Status::INDEX_MODIFIED
                | Status::INDEX_DELETED
                | Status::INDEX_RENAMED
                | Status::INDEX_TYPECHANGE,
        )
    }

    pub fn untracked_files(&self) -> Result<BTreeSet<PathBuf>> {
        self.files_with_status(Status::WT_NEW)
    }

    fn files_with_status(&self, wanted: Status) -> Result<BTreeSet<PathBuf>> {
        let repo = self.open_repo()?;
        let mut options = StatusOptions::new();
        options
            .include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);
        let statuses = repo.statuses(Some(&mut options))?;
        Ok(statuses
            .iter()
            .filter(|entry| entry.status().intersects(wanted))
            .filter_map(|entry| entry.path().map(PathBuf::from))
            .collect())
    }

    /// Short branch name, `None` when `HEAD` is detached or unborn.
    pub fn current_branch(&self) -> Result<Option<String>> {
        let repo = self.open_repo()?;
        let head = match repo.head() {
            Ok(head) => head,
            Err(_) => return Ok(None),
        };
        if !head.is_branch() {
            return Ok(None);
        }
        Ok(head.shorthand().map(str::to_string))
    }

    /// Full hash of the `HEAD` commit, `None` before the first commit.
    pub fn head_commit(&self) -> Result<Option<String>> {
        let repo = self.open_repo()?;
        let commit = match repo.head().and_then(|head| head.peel_to_commit()) {
            Ok(commit) => commit,
            Err(_) => return Ok(None),
        };
        Ok(Some(commit.id().to_string()))
    }
}

/// Changed files expressed relative to `project_root`, in the same form as
/// `Diagnostic::file_path`.
pub fn changed_files_for_project(
    project_root: &Path,
    base_ref: Option<&str>,
) -> Result<BTreeSet<String>> {
    let repo = GitRepository::discover(project_root)?;
    let changed = repo.changed_files(base_ref)?;
    Ok(changed
        .into_iter()
        .map(|path| relativize(&repo.root().join(path).to_string_lossy(), project_root))
        .collect())
}

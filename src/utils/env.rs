//! Python environment detection: virtualenvs, uv projects, tool versions.

use crate::adapters::{resolve_executable, run_with_deadline, CancellationToken};
use crate::config::AnalyzerConfig;
use crate::core::Tool;
use crate::utils::git::GitRepository;
use serde::Serialize;
use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use walkdir::WalkDir;

const VERSION_TIMEOUT: Duration = Duration::from_secs(5);
const LOCAL_VENV_DIRS: &[&str] = &[".venv", "venv"];
const MONOREPO_SCAN_DEPTH: usize = 4;

/// The active or project-local virtualenv, if any.
///
/// `VIRTUAL_ENV` wins when it points at an existing directory; otherwise
/// `<root>/.venv` and `<root>/venv` are tried.
pub fn detect_virtualenv(project_root: &Path) -> Option<PathBuf> {
    detect_virtualenv_from(env::var_os("VIRTUAL_ENV").map(PathBuf::from), project_root)
}

fn detect_virtualenv_from(active: Option<PathBuf>, project_root: &Path) -> Option<PathBuf> {
    active.filter(|p| p.is_dir()).or_else(|| {
        LOCAL_VENV_DIRS
            .iter()
            .map(|name| project_root.join(name))
            .find(|p| p.join("pyvenv.cfg").is_file() || venv_bin_dir(p).is_dir())
    })
}

fn venv_bin_dir(venv: &Path) -> PathBuf {
    if cfg!(windows) {
        venv.join("Scripts")
    } else {
        venv.join("bin")
    }
}

/// Directories searched for tool executables before `PATH`.
pub fn virtualenv_bin_dirs(project_root: &Path) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = env::var_os("VIRTUAL_ENV")
        .map(PathBuf::from)
        .filter(|p| p.is_dir())
        .map(|p| venv_bin_dir(&p))
        .into_iter()
        .collect();
    dirs.extend(
        LOCAL_VENV_DIRS
            .iter()
            .map(|name| venv_bin_dir(&project_root.join(name))),
    );
    dirs.retain(|d| d.is_dir());
    dirs.dedup();
    dirs
}

/// A project managed by uv has a `uv.lock` or at least a `pyproject.toml`.
pub fn is_uv_project(project_root: &Path) -> bool {
    project_root.join("uv.lock").is_file() || project_root.join("pyproject.toml").is_file()
}

/// Package directories below the root that carry their own
/// `pyproject.toml`. Hidden directories and virtualenvs are skipped.
pub fn monorepo_packages(project_root: &Path) -> Vec<PathBuf> {
    let mut packages: Vec<PathBuf> = WalkDir::new(project_root)
        .min_depth(2)
        .max_depth(MONOREPO_SCAN_DEPTH)
        .into_iter()
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            entry.depth() == 0
                || !(entry.file_type().is_dir()
                    && (name.starts_with('.')
                        || LOCAL_VENV_DIRS.contains(&name.as_ref())
                        || name == "node_modules"))
        })
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == "pyproject.toml")
        .filter_map(|entry| entry.path().parent().map(Path::to_path_buf))
        .collect();
    packages.sort();
    packages
}

/// First line of `<program> --version`, or `None` if it cannot be run
/// within a few seconds.
pub fn tool_version(program: &Path) -> Option<String> {
    let mut command = Command::new(program);
    command.arg("--version");
    let output = run_with_deadline(&mut command, VERSION_TIMEOUT, &CancellationToken::new()).ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolStatus {
    pub tool: Tool,
    pub engine: &'static str,
    pub enabled: bool,
    pub executable: Option<PathBuf>,
    pub version: Option<String>,
}

/// Everything `configure --show` reports about the environment.
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentReport {
    pub project_root: PathBuf,
    pub tools: Vec<ToolStatus>,
    pub virtualenv: Option<PathBuf>,
    pub uv_project: bool,
    pub monorepo_packages: Vec<PathBuf>,
    pub git_branch: Option<String>,
    pub git_commit: Option<String>,
    /// Staged and untracked file counts, when inside a repository
    pub git_pending: Option<(usize, usize)>,
}

impl EnvironmentReport {
    pub fn detect(project_root: &Path, config: &AnalyzerConfig) -> Self {
        let tools = Tool::ALL
            .iter()
            .map(|&tool| {
                let settings = config.tool_settings(tool);
                let executable = resolve_executable(
                    tool.engine(),
                    settings.executable.as_deref(),
                    project_root,
                );
                let version = executable.as_deref().and_then(tool_version);
                ToolStatus {
                    tool,
                    engine: tool.engine(),
                    enabled: settings.enabled,
                    executable,
                    version,
                }
            })
            .collect();

        let git = GitRepository::discover(project_root).ok();
        let git_branch = git.as_ref().and_then(|g| g.current_branch().ok().flatten());
        let git_commit = git.as_ref().and_then(|g| g.head_commit().ok().flatten());
        let git_pending = git.as_ref().and_then(|g| {
            let staged = g.staged_files().ok()?;
            let untracked = g.untracked_files().ok()?;
            Some((staged.len(), untracked.len()))
        });

        Self {
            project_root: project_root.to_path_buf(),
            tools,
            virtualenv: detect_virtualenv(project_root),
            uv_project: is_uv_project(project_root),
            monorepo_packages: monorepo_packages(project_root),
            git_branch,
            git_commit,
            git_pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_detect_local_virtualenv() {
        let temp = TempDir::new().unwrap();
        assert_eq!(detect_virtualenv_from(None, temp.path()), None);

        fs::create_dir_all(temp.path().join(".venv")).unwrap();
        fs::write(temp.path().join(".venv/pyvenv.cfg"), "home = /usr/bin\n").unwrap();
        assert_eq!(
            detect_virtualenv_from(None, temp.path()),
            Some(temp.path().join(".venv"))
        );
    }

    #[test]
    fn test_active_virtualenv_wins() {
        let temp = TempDir::new().unwrap();
        let active = temp.path().join("active");
        fs::create_dir_all(&active).unwrap();
        fs::create_dir_all(temp.path().join(".venv")).unwrap();
        fs::write(temp.path().join(".venv/pyvenv.cfg"), "").unwrap();

        assert_eq!(
            detect_virtualenv_from(Some(active.clone()), temp.path()),
            Some(active)
        );
        assert_eq!(
            detect_virtualenv_from(Some(temp.path().join("gone")), temp.path()),
            Some(temp.path().join(".venv"))
        );
    }

    #[test]
    fn test_uv_project_and_monorepo_detection() {
        let temp = TempDir::new().unwrap();
        assert!(!is_uv_project(temp.path()));
        fs::write(temp.path().join("pyproject.toml"), "[project]\nname = \"root\"\n").unwrap();
        assert!(is_uv_project(temp.path()));
        assert!(monorepo_packages(temp.path()).is_empty());

        for package in ["packages/core", "packages/api", ".venv/lib/site"] {
            let dir = temp.path().join(package);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("pyproject.toml"), "").unwrap();
        }
        assert_eq!(
            monorepo_packages(temp.path()),
            vec![
                temp.path().join("packages/api"),
                temp.path().join("packages/core")
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_tool_version() {
        let temp = TempDir::new().unwrap();
        assert_eq!(tool_version(&temp.path().join("missing")), None);

        let echo = Path::new("/bin/echo");
        if echo.exists() {
            assert!(tool_version(echo).is_some());
        }
    }
}

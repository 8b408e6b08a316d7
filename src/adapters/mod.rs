//! Tool adapters.
//!
//! Each adapter wraps one external engine: it knows how to build the
//! command line, which exit codes are normal, and how to parse the engine's
//! machine-readable output into its raw schema. Mapping into canonical
//! diagnostics happens later, in `pipeline::normalize`.

pub mod process;
pub mod pyright;
pub mod ruff;

use crate::config::{AnalyzerConfig, ToolSettings};
use crate::core::{Tool, ToolError};
use crate::utils::env::virtualenv_bin_dirs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

pub use process::{run_with_deadline, CancellationToken, ProcessError, ProcessOutput};
pub use pyright::{PyrightAdapter, PyrightDiagnostic, PyrightReport};
pub use ruff::{RuffAdapter, RuffFinding};

/// Raw output of one tool, tagged by the tool that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawOutput {
    TypeChecker(PyrightReport),
    Linter(Vec<RuffFinding>),
}

impl RawOutput {
    pub fn tool(&self) -> Tool {
        match self {
            Self::TypeChecker(_) => Tool::TypeChecker,
            Self::Linter(_) => Tool::Linter,
        }
    }

    pub fn finding_count(&self) -> usize {
        match self {
            Self::TypeChecker(report) => report.general_diagnostics.len(),
            Self::Linter(findings) => findings.len(),
        }
    }

    pub fn empty(tool: Tool) -> Self {
        match tool {
            Tool::TypeChecker => Self::TypeChecker(PyrightReport::default()),
            Tool::Linter => Self::Linter(Vec::new()),
        }
    }
}

/// Per-invocation limits handed to an adapter.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub timeout: Duration,
    pub cancel: CancellationToken,
}

pub trait ToolAdapter: Send + Sync {
    fn tool(&self) -> Tool;

    /// Fully configured command, ready to spawn.
    fn command(&self, project_root: &Path) -> Result<Command, ToolError>;

    /// Both engines exit with 1 when they report findings.
    fn accepts_exit_code(&self, code: i32) -> bool {
        code == 0 || code == 1
    }

    fn parse(&self, stdout: &[u8]) -> Result<RawOutput, ToolError>;

    fn run(&self, project_root: &Path, ctx: &RunContext) -> Result<RawOutput, ToolError> {
        let tool = self.tool();
        let mut command = self.command(project_root)?;
        tracing::debug!(%tool, ?command, "spawning tool");

        let output = run_with_deadline(&mut command, ctx.timeout, &ctx.cancel)
            .map_err(|e| process_error_to_tool_error(tool, ctx.timeout, e))?;

        match output.status.code() {
            Some(code) if self.accepts_exit_code(code) => self.parse(&output.stdout),
            Some(code) => Err(ToolError::invocation(
                tool,
                format!("exited with status {code}: {}", output.stderr_excerpt()),
            )),
            None => Err(ToolError::invocation(tool, "terminated by signal")),
        }
    }
}

pub fn process_error_to_tool_error(tool: Tool, timeout: Duration, error: ProcessError) -> ToolError {
    match error {
        ProcessError::Spawn(e) => ToolError::invocation(tool, format!("failed to start: {e}")),
        ProcessError::Wait(e) => ToolError::invocation(tool, format!("failed to wait: {e}")),
        ProcessError::Timeout => ToolError::Timeout { tool, timeout },
        ProcessError::Cancelled => ToolError::Cancelled { tool },
    }
}

/// Locate a tool executable: explicit setting, then the project's
/// virtualenv, then `PATH`.
pub fn resolve_executable(
    name: &str,
    explicit: Option<&Path>,
    project_root: &Path,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return which::which(path).ok().or_else(|| Some(path.to_path_buf()));
    }

    virtualenv_bin_dirs(project_root)
        .into_iter()
        .find_map(|dir| which::which_in(name, Some(&dir), project_root).ok())
        .or_else(|| which::which(name).ok())
}

pub(crate) fn build_command(
    tool: Tool,
    settings: &ToolSettings,
    project_root: &Path,
) -> Result<Command, ToolError> {
    let program = resolve_executable(tool.engine(), settings.executable.as_deref(), project_root)
        .ok_or_else(|| {
            ToolError::invocation(tool, format!("`{}` not found in virtualenv or PATH", tool.engine()))
        })?;
    let mut command = Command::new(program);
    command.current_dir(project_root);
    Ok(command)
}

/// Adapters for every tool enabled in `config`, type checker first.
pub fn from_config(config: &AnalyzerConfig) -> Vec<Box<dyn ToolAdapter>> {
    let mut adapters: Vec<Box<dyn ToolAdapter>> = Vec::new();
    if config.tools.type_checker.enabled {
        adapters.push(Box::new(PyrightAdapter::new(config.tools.type_checker.clone())));
    }
    if config.tools.linter.enabled {
        adapters.push(Box::new(
            RuffAdapter::new(config.tools.linter.clone())
                .with_exclude(config.exclude.patterns.clone()),
        ));
    }
    adapters
}

//! Linter adapter (`ruff check --output-format=json`).
//!
//! Ruff also applies its own fixes; `fix_command` builds that invocation for
//! the `fix` command. No fix logic lives on our side.

use super::{build_command, RawOutput, ToolAdapter};
use crate::config::ToolSettings;
use crate::core::{Tool, ToolError};
use serde::Deserialize;
use std::path::Path;
use std::process::Command;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RuffFinding {
    /// `null` for syntax errors.
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub location: Option<RuffLocation>,
    #[serde(default)]
    pub fix: Option<RuffFix>,
    #[serde(default)]
    pub url: Option<String>,
    /// Not emitted by every ruff release.
    #[serde(default)]
    pub severity: Option<String>,
}

/// One-based position.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RuffLocation {
    #[serde(default)]
    pub row: Option<i64>,
    #[serde(default)]
    pub column: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RuffFix {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub applicability: Option<String>,
}

/// How the `fix` command asks ruff to change files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixMode {
    pub dry_run: bool,
    pub unsafe_fixes: bool,
}

pub struct RuffAdapter {
    settings: ToolSettings,
    exclude: Vec<String>,
}

impl RuffAdapter {
    pub fn new(settings: ToolSettings) -> Self {
        Self {
            settings,
            exclude: Vec::new(),
        }
    }

    /// Project exclusion globs, forwarded as `--extend-exclude` so ruff
    /// neither reports nor rewrites the files our report leaves out.
    pub fn with_exclude(mut self, patterns: Vec<String>) -> Self {
        self.exclude = patterns;
        self
    }

    fn exclude_args(&self, command: &mut Command) {
        if !self.exclude.is_empty() {
            command.arg("--extend-exclude").arg(self.exclude.join(","));
        }
    }

    pub fn parse_output(output: &[u8]) -> Result<Vec<RuffFinding>, ToolError> {
        let text = String::from_utf8_lossy(output);
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&text).map_err(|e| {
            ToolError::invocation(Tool::Linter, format!("failed to parse ruff output: {e}"))
        })
    }

    /// `ruff check --fix` (or `--diff` for a dry run) over the project.
    pub fn fix_command(&self, project_root: &Path, mode: FixMode) -> Result<Command, ToolError> {
        let mut command = build_command(Tool::Linter, &self.settings, project_root)?;
        command.args(["check", "--no-cache", "--exit-zero"]);
        command.arg(if mode.dry_run { "--diff" } else { "--fix" });
        if mode.unsafe_fixes {
            command.arg("--unsafe-fixes");
        }
        self.exclude_args(&mut command);
        command.args(&self.settings.args).arg(".");
        Ok(command)
    }
}

impl ToolAdapter for RuffAdapter {
    fn tool(&self) -> Tool {
        Tool::Linter
    }

    fn command(&self, project_root: &Path) -> Result<Command, ToolError> {
        let mut command = build_command(Tool::Linter, &self.settings, project_root)?;
        command.args(["check", "--output-format=json", "--no-cache", "--exit-zero"]);
        self.exclude_args(&mut command);
        command.args(&self.settings.args).arg(".");
        Ok(command)
    }

    fn parse(&self, stdout: &[u8]) -> Result<RawOutput, ToolError> {
        Self::parse_output(stdout).map(RawOutput::Linter)
    }
}

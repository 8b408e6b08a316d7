//! CLI command implementations.
//!
//! - **analyze**: run both tools and report merged diagnostics
//! - **suggest**: report only diagnostics with an available fix
//! - **fix**: back up files and let the linter apply its own fixes
//! - **configure**: write or show `.pyanalyzer.toml`

pub mod analyze;
pub mod configure;
pub mod fix;
pub mod suggest;

pub use analyze::{handle_analyze, AnalyzeConfig};
pub use configure::{handle_configure, ConfigureConfig};
pub use fix::{handle_fix, FixCommandConfig};
pub use suggest::{handle_suggest, SuggestConfig};

use crate::adapters::{self, CancellationToken};
use crate::config::{self, AnalyzerConfig, DedupMode};
use crate::core::{PipelineError, Tool};
use crate::formatting::FormattingConfig;
use crate::io::{create_writer, OutputFormat};
use crate::observability::{set_phase, AnalysisPhase};
use crate::pipeline::{run_pipeline, PipelineOutcome};
use crate::utils::{files, git};
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// How a command ended, mapped to the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Success,
    /// Diagnostics at or above the `--fail-on` threshold
    Findings,
    /// Interrupted; nothing was reported
    Cancelled,
}

impl CommandOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Findings => 1,
            Self::Cancelled => 130,
        }
    }
}

/// Command-line adjustments applied on top of the loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOverrides {
    pub changed_only: bool,
    pub base_ref: Option<String>,
    pub timeout_secs: Option<u64>,
    pub fuzzy_threshold: Option<f64>,
    pub no_type_checker: bool,
    pub no_linter: bool,
}

impl AnalysisOverrides {
    pub fn apply(&self, config: &mut AnalyzerConfig) -> Result<()> {
        if let Some(timeout) = self.timeout_secs {
            for tool in Tool::ALL {
                config.tool_settings_mut(tool).timeout_secs = timeout;
            }
        }
        if let Some(threshold) = self.fuzzy_threshold {
            config.dedup.mode = DedupMode::Fuzzy;
            config.dedup.threshold = threshold;
        }
        if self.no_type_checker {
            config.tools.type_checker.enabled = false;
        }
        if self.no_linter {
            config.tools.linter.enabled = false;
        }
        config.validate().context("Invalid command-line options")?;
        Ok(())
    }
}

/// Where and how to render a report.
#[derive(Debug, Clone)]
pub struct ReportTarget {
    pub format: Option<OutputFormat>,
    pub output: Option<PathBuf>,
    pub formatting: FormattingConfig,
}

impl ReportTarget {
    pub fn render(&self, outcome: &PipelineOutcome, config: &AnalyzerConfig) -> Result<()> {
        let _phase = set_phase(AnalysisPhase::Rendering);
        let format = self.format.unwrap_or(config.output.default_format);
        let mut writer = create_writer(format, self.output.as_deref(), self.formatting)?;
        writer.write_outcome(outcome)?;
        if let Some(path) = &self.output {
            tracing::info!("Report written to {}", path.display());
        }
        Ok(())
    }
}

/// Canonical project directory for `path`.
pub fn resolve_project_root(path: &Path) -> Result<PathBuf> {
    let root = path
        .canonicalize()
        .with_context(|| format!("Project path {} does not exist", path.display()))?;
    if !root.is_dir() {
        anyhow::bail!("Project path {} is not a directory", root.display());
    }
    Ok(root)
}

/// Explicit `--config` file, or the nearest `.pyanalyzer.toml`.
pub fn load_effective_config(project_root: &Path, explicit: Option<&Path>) -> Result<AnalyzerConfig> {
    match explicit {
        Some(path) => config::load_config_from(path)
            .with_context(|| format!("Could not load configuration from {}", path.display())),
        None => Ok(config::load_config(project_root)),
    }
}

/// Discovery plus the full pipeline. `Ok(None)` means the run was cancelled.
pub(crate) fn run_analysis(
    project_root: &Path,
    config: &AnalyzerConfig,
    overrides: &AnalysisOverrides,
    cancel: &CancellationToken,
) -> Result<Option<PipelineOutcome>> {
    let changed = {
        let _phase = set_phase(AnalysisPhase::Discovery);
        report_discovery(project_root, config);
        changed_file_set(project_root, overrides)?
    };

    let adapters = adapters::from_config(config);
    if adapters.is_empty() {
        tracing::warn!("Both tools are disabled; the report will be empty");
    }

    match run_pipeline(project_root, config, &adapters, cancel, changed.as_ref()) {
        Ok(outcome) => Ok(Some(outcome)),
        Err(PipelineError::Cancelled) => Ok(None),
    }
}

fn report_discovery(project_root: &Path, config: &AnalyzerConfig) {
    match files::find_python_files(project_root, &config.exclude_patterns()) {
        Ok(found) if found.is_empty() => {
            tracing::warn!("No Python files found under {}", project_root.display());
        }
        Ok(found) => tracing::info!("Found {} Python file(s)", found.len()),
        Err(e) => tracing::debug!("File discovery failed: {e:#}"),
    }
}

fn changed_file_set(
    project_root: &Path,
    overrides: &AnalysisOverrides,
) -> Result<Option<BTreeSet<String>>> {
    if !overrides.changed_only {
        return Ok(None);
    }
    let changed = git::changed_files_for_project(project_root, overrides.base_ref.as_deref())
        .context("--changed-only requires a git repository")?;
    tracing::info!("Restricting report to {} changed file(s)", changed.len());
    Ok(Some(changed))
}

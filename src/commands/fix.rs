//! `fix`: back up affected files, let ruff apply its own fixes, re-analyze.

use super::{
    load_effective_config, resolve_project_root, run_analysis, AnalysisOverrides, CommandOutcome,
    ReportTarget,
};
use crate::adapters::ruff::FixMode;
use crate::adapters::{
    process_error_to_tool_error, run_with_deadline, CancellationToken, ProcessError,
    ProcessOutput, RuffAdapter,
};
use crate::config::AnalyzerConfig;
use crate::core::{AnalysisRun, Tool};
use crate::observability::{set_phase, AnalysisPhase};
use crate::utils::files::create_backup;
use anyhow::{bail, Result};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct FixCommandConfig {
    pub path: PathBuf,
    pub config_file: Option<PathBuf>,
    pub dry_run: bool,
    pub no_backup: bool,
    pub unsafe_fixes: bool,
    pub target: ReportTarget,
}

/// Files holding at least one fixable linter diagnostic.
pub fn fixable_files(run: &AnalysisRun, project_root: &Path) -> BTreeSet<PathBuf> {
    run.iter()
        .filter(|d| d.tool() == Tool::Linter && d.is_fixable())
        .map(|d| project_root.join(d.file_path()))
        .collect()
}

pub fn handle_fix(config: FixCommandConfig, cancel: &CancellationToken) -> Result<CommandOutcome> {
    let project_root = resolve_project_root(&config.path)?;
    let analyzer_config = load_effective_config(&project_root, config.config_file.as_deref())?;
    if !analyzer_config.tools.linter.enabled {
        bail!("The linter is disabled in the configuration; nothing can be fixed");
    }

    let mut linter_only = analyzer_config.clone();
    linter_only.tools.type_checker.enabled = false;
    let overrides = AnalysisOverrides::default();
    let Some(before) = run_analysis(&project_root, &linter_only, &overrides, cancel)? else {
        return Ok(CommandOutcome::Cancelled);
    };

    let targets = fixable_files(&before.run, &project_root);
    let fixable = before.run.iter().filter(|d| d.is_fixable()).count();
    let mode = FixMode {
        dry_run: config.dry_run,
        unsafe_fixes: config.unsafe_fixes || analyzer_config.fix.unsafe_fixes,
    };

    if targets.is_empty() {
        eprintln!("No fixable issues found");
    } else {
        let _phase = set_phase(AnalysisPhase::Fixing);
        if !mode.dry_run && analyzer_config.fix.backup && !config.no_backup {
            for file in &targets {
                let backup = create_backup(file)?;
                eprintln!("Backed up {} -> {}", file.display(), backup.display());
            }
        }

        let Some(output) = run_linter_fixer(&project_root, &analyzer_config, mode, cancel)? else {
            return Ok(CommandOutcome::Cancelled);
        };

        if mode.dry_run {
            std::io::stdout().write_all(&output.stdout)?;
            eprintln!(
                "{fixable} fixable issue(s) in {} file(s); run without --dry-run to apply",
                targets.len()
            );
            return Ok(CommandOutcome::Success);
        }
    }

    let Some(after) = run_analysis(&project_root, &analyzer_config, &overrides, cancel)? else {
        return Ok(CommandOutcome::Cancelled);
    };
    if !targets.is_empty() {
        let remaining = after.run.iter().filter(|d| d.is_fixable()).count();
        eprintln!(
            "Fixed {} issue(s) in {} file(s)",
            fixable.saturating_sub(remaining),
            targets.len()
        );
    }
    config.target.render(&after, &analyzer_config)?;
    Ok(CommandOutcome::Success)
}

/// `Ok(None)` when cancelled.
fn run_linter_fixer(
    project_root: &Path,
    config: &AnalyzerConfig,
    mode: FixMode,
    cancel: &CancellationToken,
) -> Result<Option<ProcessOutput>> {
    let settings = &config.tools.linter;
    let mut command = RuffAdapter::new(settings.clone())
        .with_exclude(config.exclude.patterns.clone())
        .fix_command(project_root, mode)?;
    tracing::debug!(?command, "running linter fixer");

    let output = match run_with_deadline(&mut command, settings.timeout(), cancel) {
        Ok(output) => output,
        Err(ProcessError::Cancelled) => return Ok(None),
        Err(e) => return Err(process_error_to_tool_error(Tool::Linter, settings.timeout(), e).into()),
    };

    match output.status.code() {
        Some(0) | Some(1) => Ok(Some(output)),
        Some(code) => bail!(
            "ruff exited with status {code} while fixing: {}",
            output.stderr_excerpt()
        ),
        None => bail!("ruff was terminated by a signal while fixing"),
    }
}

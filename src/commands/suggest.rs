use super::{
    load_effective_config, resolve_project_root, run_analysis, AnalysisOverrides, CommandOutcome,
    ReportTarget,
};
use crate::adapters::CancellationToken;
use crate::core::AnalysisRun;
use anyhow::Result;
use std::path::PathBuf;

pub struct SuggestConfig {
    pub path: PathBuf,
    pub config_file: Option<PathBuf>,
    pub overrides: AnalysisOverrides,
    pub target: ReportTarget,
}

/// Diagnostics the user can act on directly: fixable ones and those
/// carrying a suggestion.
pub fn actionable(run: &AnalysisRun) -> AnalysisRun {
    run.filtered(|d| d.is_fixable() || d.suggestion().is_some())
}

pub fn handle_suggest(config: SuggestConfig, cancel: &CancellationToken) -> Result<CommandOutcome> {
    let project_root = resolve_project_root(&config.path)?;
    let mut analyzer_config = load_effective_config(&project_root, config.config_file.as_deref())?;
    config.overrides.apply(&mut analyzer_config)?;

    let Some(outcome) = run_analysis(&project_root, &analyzer_config, &config.overrides, cancel)?
    else {
        return Ok(CommandOutcome::Cancelled);
    };

    let suggestions = outcome.with_run(actionable(&outcome.run));
    tracing::info!(
        "{} of {} diagnostic(s) have a suggested fix",
        suggestions.run.len(),
        outcome.run.len()
    );
    config.target.render(&suggestions, &analyzer_config)?;
    Ok(CommandOutcome::Success)
}

use super::{
    load_effective_config, resolve_project_root, run_analysis, AnalysisOverrides, CommandOutcome,
    ReportTarget,
};
use crate::adapters::CancellationToken;
use crate::config::FailOn;
use anyhow::Result;
use std::path::PathBuf;

pub struct AnalyzeConfig {
    pub path: PathBuf,
    pub config_file: Option<PathBuf>,
    pub overrides: AnalysisOverrides,
    pub target: ReportTarget,
    pub fail_on: Option<FailOn>,
}

pub fn handle_analyze(config: AnalyzeConfig, cancel: &CancellationToken) -> Result<CommandOutcome> {
    let project_root = resolve_project_root(&config.path)?;
    let mut analyzer_config = load_effective_config(&project_root, config.config_file.as_deref())?;
    config.overrides.apply(&mut analyzer_config)?;

    let Some(outcome) = run_analysis(&project_root, &analyzer_config, &config.overrides, cancel)?
    else {
        return Ok(CommandOutcome::Cancelled);
    };

    config.target.render(&outcome, &analyzer_config)?;

    let fail_on = config.fail_on.unwrap_or(analyzer_config.output.fail_on);
    if fail_on.is_met_by(&outcome.run) {
        Ok(CommandOutcome::Findings)
    } else {
        Ok(CommandOutcome::Success)
    }
}

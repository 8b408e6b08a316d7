//! Analysis pipeline: run adapters, normalize, aggregate, filter.
//!
//! Adapter failures never abort a run. Timeouts and invocation failures
//! become an empty contribution plus a [`RunCondition`]; only cancellation
//! stops the pipeline.

pub mod aggregate;
pub mod normalize;

pub use aggregate::{aggregate, DedupRule};
pub use normalize::{normalize, relativize, Normalized};

use crate::adapters::{CancellationToken, RawOutput, RunContext, ToolAdapter};
use crate::config::AnalyzerConfig;
use crate::core::{AnalysisRun, MalformedDiagnostic, PipelineError, Tool, ToolError};
use crate::observability::{
    increment_processed, set_current_tool, set_phase, set_progress, AnalysisPhase,
};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Non-fatal problem surfaced next to the diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunCondition {
    ToolInvocation { tool: Tool, message: String },
    ToolTimeout { tool: Tool, timeout_secs: u64 },
    Malformed { tool: Tool, count: usize },
}

impl RunCondition {
    pub fn tool(&self) -> Tool {
        match self {
            Self::ToolInvocation { tool, .. }
            | Self::ToolTimeout { tool, .. }
            | Self::Malformed { tool, .. } => *tool,
        }
    }
}

impl fmt::Display for RunCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToolInvocation { tool, message } => write!(f, "{tool} failed: {message}"),
            Self::ToolTimeout { tool, timeout_secs } => {
                write!(f, "{tool} timed out after {timeout_secs}s; its findings are missing")
            }
            Self::Malformed { tool, count } => {
                write!(f, "{count} {tool} finding(s) could not be read and were skipped")
            }
        }
    }
}

/// Everything a renderer needs from one run.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub project_root: PathBuf,
    pub generated_at: DateTime<Utc>,
    pub run: AnalysisRun,
    pub conditions: Vec<RunCondition>,
    pub skipped: Vec<MalformedDiagnostic>,
}

impl PipelineOutcome {
    pub fn has_conditions(&self) -> bool {
        !self.conditions.is_empty()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Same outcome with a different set of diagnostics.
    pub fn with_run(&self, run: AnalysisRun) -> Self {
        Self {
            run,
            ..self.clone()
        }
    }
}

/// Run every adapter concurrently and build the merged outcome.
///
/// `changed` restricts the result to the given project-relative files.
pub fn run_pipeline(
    project_root: &Path,
    config: &AnalyzerConfig,
    adapters: &[Box<dyn ToolAdapter>],
    cancel: &CancellationToken,
    changed: Option<&BTreeSet<String>>,
) -> Result<PipelineOutcome, PipelineError> {
    let span = tracing::info_span!("pipeline", root = %project_root.display());
    let _enter = span.enter();

    let results = invoke_adapters(project_root, config, adapters, cancel);
    if cancel.is_cancelled() {
        return Err(PipelineError::Cancelled);
    }

    let mut conditions = Vec::new();
    let mut contributions = Vec::with_capacity(results.len());
    let mut skipped = Vec::new();

    {
        let _phase = set_phase(AnalysisPhase::Normalization);
        let _span = tracing::info_span!("normalize").entered();
        for (tool, result) in results {
            match result {
                Ok(raw) => {
                    let normalized = normalize(&raw, project_root);
                    tracing::debug!(
                        %tool,
                        findings = raw.finding_count(),
                        kept = normalized.diagnostics.len(),
                        "normalized tool output"
                    );
                    if !normalized.skipped.is_empty() {
                        tracing::warn!(
                            %tool,
                            count = normalized.skipped.len(),
                            "skipped malformed findings"
                        );
                        conditions.push(RunCondition::Malformed {
                            tool,
                            count: normalized.skipped.len(),
                        });
                    }
                    contributions.push(normalized.diagnostics);
                    skipped.extend(normalized.skipped);
                }
                Err(ToolError::Cancelled { .. }) => return Err(PipelineError::Cancelled),
                Err(ToolError::Timeout { tool, timeout }) => {
                    tracing::warn!(%tool, timeout_secs = timeout.as_secs(), "tool timed out");
                    conditions.push(RunCondition::ToolTimeout {
                        tool,
                        timeout_secs: timeout.as_secs(),
                    });
                }
                Err(ToolError::Invocation { tool, message }) => {
                    tracing::warn!(%tool, %message, "tool invocation failed");
                    conditions.push(RunCondition::ToolInvocation { tool, message });
                }
            }
        }
    }

    let run = {
        let _phase = set_phase(AnalysisPhase::Aggregation);
        let _span = tracing::info_span!("aggregate").entered();
        let run = aggregate(contributions, &config.dedup_rule());
        apply_filters(run, config, changed)
    };
    tracing::info!(diagnostics = run.len(), conditions = conditions.len(), "analysis complete");

    Ok(PipelineOutcome {
        project_root: project_root.to_path_buf(),
        generated_at: Utc::now(),
        run,
        conditions,
        skipped,
    })
}

fn invoke_adapters(
    project_root: &Path,
    config: &AnalyzerConfig,
    adapters: &[Box<dyn ToolAdapter>],
    cancel: &CancellationToken,
) -> Vec<(Tool, Result<RawOutput, ToolError>)> {
    let _phase = set_phase(AnalysisPhase::ToolInvocation);
    set_progress(0, adapters.len());

    adapters
        .par_iter()
        .map(|adapter| {
            let tool = adapter.tool();
            let _phase = set_phase(AnalysisPhase::ToolInvocation);
            let _tool = set_current_tool(tool);
            let _span = tracing::info_span!("tool", %tool).entered();

            let ctx = RunContext {
                timeout: config.tool_settings(tool).timeout(),
                cancel: cancel.clone(),
            };
            let result = adapter.run(project_root, &ctx);
            increment_processed();
            (tool, result)
        })
        .collect()
}

fn apply_filters(
    run: AnalysisRun,
    config: &AnalyzerConfig,
    changed: Option<&BTreeSet<String>>,
) -> AnalysisRun {
    let patterns = config.exclude_patterns();
    let run = if patterns.is_empty() {
        run
    } else {
        run.filtered(|d| !patterns.iter().any(|p| p.matches(d.file_path())))
    };
    match changed {
        Some(files) => run.retain_files(files),
        None => run,
    }
}

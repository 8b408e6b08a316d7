// Export modules for library usage
pub mod adapters;
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod formatting;
pub mod io;
pub mod observability;
pub mod pipeline;
pub mod utils;

// Re-export commonly used types
pub use crate::core::{
    AnalysisRun, Category, ConfigError, Diagnostic, MalformedDiagnostic, PipelineError,
    RunSummary, Severity, Tool, ToolError,
};

pub use crate::adapters::{
    CancellationToken, PyrightAdapter, RawOutput, RuffAdapter, RunContext, ToolAdapter,
};

pub use crate::config::{load_config, AnalyzerConfig};

pub use crate::pipeline::{
    aggregate, normalize, run_pipeline, DedupRule, PipelineOutcome, RunCondition,
};

pub use crate::io::output::{create_writer, OutputFormat, OutputWriter};

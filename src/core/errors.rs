//! Shared error types for the application

use super::Tool;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single tool adapter.
///
/// None of these is fatal to a run on its own: invocation failures and
/// timeouts reduce coverage, only cancellation stops the pipeline.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToolError {
    /// Subprocess failed to start, exited abnormally, or produced output
    /// that could not be parsed.
    #[error("{tool} invocation failed: {message}")]
    Invocation { tool: Tool, message: String },

    /// Subprocess exceeded its time budget and was killed.
    #[error("{tool} timed out after {}s", timeout.as_secs_f64())]
    Timeout { tool: Tool, timeout: Duration },

    /// The run was cancelled while the subprocess was running.
    #[error("{tool} cancelled")]
    Cancelled { tool: Tool },
}

impl ToolError {
    pub fn invocation(tool: Tool, message: impl Into<String>) -> Self {
        Self::Invocation {
            tool,
            message: message.into(),
        }
    }

    pub fn tool(&self) -> Tool {
        match self {
            Self::Invocation { tool, .. } | Self::Timeout { tool, .. } | Self::Cancelled { tool } => {
                *tool
            }
        }
    }
}

/// A raw finding that could not be mapped to a `Diagnostic`.
#[derive(Debug, Clone, Error, PartialEq, Eq, serde::Serialize)]
#[error("{tool} finding #{index} skipped: {reason}")]
pub struct MalformedDiagnostic {
    pub tool: Tool,
    /// Position of the record in the tool's raw output.
    pub index: usize,
    pub reason: String,
}

impl MalformedDiagnostic {
    pub fn missing(tool: Tool, index: usize, field: &str) -> Self {
        Self {
            tool,
            index,
            reason: format!("missing required field `{field}`"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// User interrupt; no report must be emitted.
    #[error("analysis cancelled")]
    Cancelled,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

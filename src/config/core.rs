use crate::core::{AnalysisRun, ConfigError, Severity, Tool};
use crate::io::output::OutputFormat;
use crate::pipeline::DedupRule;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure (`.pyanalyzer.toml`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub dedup: DedupConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub exclude: ExcludeConfig,

    #[serde(default)]
    pub fix: FixConfig,
}

impl AnalyzerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, settings) in [
            ("type_checker", &self.tools.type_checker),
            ("linter", &self.tools.linter),
        ] {
            if settings.timeout_secs == 0 {
                return Err(ConfigError::Invalid(format!(
                    "tools.{name}.timeout_secs must be greater than 0"
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.dedup.threshold) {
            return Err(ConfigError::Invalid(format!(
                "dedup.threshold must be between 0.0 and 1.0, got {}",
                self.dedup.threshold
            )));
        }

        for pattern in &self.exclude.patterns {
            glob::Pattern::new(pattern).map_err(|e| {
                ConfigError::Invalid(format!("invalid exclude pattern '{pattern}': {e}"))
            })?;
        }

        Ok(())
    }

    pub fn tool_settings(&self, tool: Tool) -> &ToolSettings {
        match tool {
            Tool::TypeChecker => &self.tools.type_checker,
            Tool::Linter => &self.tools.linter,
        }
    }

    pub fn tool_settings_mut(&mut self, tool: Tool) -> &mut ToolSettings {
        match tool {
            Tool::TypeChecker => &mut self.tools.type_checker,
            Tool::Linter => &mut self.tools.linter,
        }
    }

    pub fn dedup_rule(&self) -> DedupRule {
        match self.dedup.mode {
            DedupMode::Exact => DedupRule::Exact,
            DedupMode::Fuzzy => DedupRule::Fuzzy {
                threshold: self.dedup.threshold,
            },
        }
    }

    /// Compiled exclusion patterns. Invalid patterns are dropped (they are
    /// rejected earlier by `validate`).
    pub fn exclude_patterns(&self) -> Vec<glob::Pattern> {
        self.exclude
            .patterns
            .iter()
            .filter_map(|p| glob::Pattern::new(p).ok())
            .collect()
    }
}

/// Settings shared by both wrapped tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Explicit executable; otherwise the virtualenv and `PATH` are searched
    #[serde(default)]
    pub executable: Option<PathBuf>,

    /// Extra arguments appended to the tool's command line
    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ToolSettings {
    fn with_timeout(timeout_secs: u64) -> Self {
        Self {
            enabled: true,
            executable: None,
            args: Vec::new(),
            timeout_secs,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self::with_timeout(default_timeout_secs())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_type_checker")]
    pub type_checker: ToolSettings,

    #[serde(default = "default_linter")]
    pub linter: ToolSettings,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            type_checker: default_type_checker(),
            linter: default_linter(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupMode {
    #[default]
    Exact,
    /// Best-effort similarity matching; see `pipeline::aggregate`.
    Fuzzy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DedupConfig {
    #[serde(default)]
    pub mode: DedupMode,

    /// Minimum normalized similarity (0.0-1.0) for fuzzy matches
    #[serde(default = "default_fuzzy_threshold")]
    pub threshold: f64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            mode: DedupMode::Exact,
            threshold: default_fuzzy_threshold(),
        }
    }
}

/// Lowest severity that makes `analyze` exit non-zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FailOn {
    #[default]
    Error,
    Warning,
    Info,
    Never,
}

impl FailOn {
    /// Lowest severity that fails the run, `None` for `never`.
    pub fn threshold(&self) -> Option<Severity> {
        match self {
            Self::Error => Some(Severity::Error),
            Self::Warning => Some(Severity::Warning),
            Self::Info => Some(Severity::Info),
            Self::Never => None,
        }
    }

    pub fn is_met_by(&self, run: &AnalysisRun) -> bool {
        match (self.threshold(), run.highest_severity()) {
            (Some(threshold), Some(highest)) => highest >= threshold,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub default_format: OutputFormat,

    #[serde(default)]
    pub fail_on: FailOn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludeConfig {
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl Default for ExcludeConfig {
    fn default() -> Self {
        Self {
            patterns: vec![
                ".venv/**".to_string(),
                "venv/**".to_string(),
                "build/**".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixConfig {
    /// Copy files before the linter rewrites them
    #[serde(default = "default_true")]
    pub backup: bool,

    #[serde(default)]
    pub unsafe_fixes: bool,
}

impl Default for FixConfig {
    fn default() -> Self {
        Self {
            backup: true,
            unsafe_fixes: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_type_checker() -> ToolSettings {
    ToolSettings::with_timeout(120)
}

fn default_linter() -> ToolSettings {
    ToolSettings::with_timeout(60)
}

fn default_fuzzy_threshold() -> f64 {
    0.9
}

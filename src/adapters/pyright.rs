//! Type checker adapter (`pyright --outputjson`).

use super::{build_command, RawOutput, ToolAdapter};
use crate::config::ToolSettings;
use crate::core::{Tool, ToolError};
use serde::Deserialize;
use std::path::Path;
use std::process::Command;

/// Top level of pyright's JSON report. Every field is optional so that
/// missing data is caught during normalization rather than here.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PyrightReport {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub general_diagnostics: Vec<PyrightDiagnostic>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PyrightDiagnostic {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub rule: Option<String>,
    #[serde(default)]
    pub range: Option<PyrightRange>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PyrightRange {
    #[serde(default)]
    pub start: Option<PyrightPosition>,
}

/// Zero-based position.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PyrightPosition {
    #[serde(default)]
    pub line: Option<i64>,
    #[serde(default)]
    pub character: Option<i64>,
}

pub struct PyrightAdapter {
    settings: ToolSettings,
}

impl PyrightAdapter {
    pub fn new(settings: ToolSettings) -> Self {
        Self { settings }
    }

    pub fn parse_output(output: &[u8]) -> Result<PyrightReport, ToolError> {
        serde_json::from_slice(output).map_err(|e| {
            ToolError::invocation(
                Tool::TypeChecker,
                format!("failed to parse pyright output: {e}"),
            )
        })
    }
}

impl ToolAdapter for PyrightAdapter {
    fn tool(&self) -> Tool {
        Tool::TypeChecker
    }

    fn command(&self, project_root: &Path) -> Result<Command, ToolError> {
        let mut command = build_command(Tool::TypeChecker, &self.settings, project_root)?;
        command.arg("--outputjson").args(&self.settings.args);
        Ok(command)
    }

    fn parse(&self, stdout: &[u8]) -> Result<RawOutput, ToolError> {
        Self::parse_output(stdout).map(RawOutput::TypeChecker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_parse_pyright_output() {
        let output = indoc! {r#"
            {
                "version": "1.1.380",
                "time": "1700000000000",
                "generalDiagnostics": [
                    {
                        "file": "/project/src/app.py",
                        "severity": "error",
                        "message": "Import \"requests\" could not be resolved",
                        "range": {
                            "start": {"line": 2, "character": 7},
                            "end": {"line": 2, "character": 15}
                        },
                        "rule": "reportMissingImports"
                    },
                    {
                        "file": "/project/src/app.py",
                        "severity": "information",
                        "message": "Unreachable code"
                    }
                ],
                "summary": {"filesAnalyzed": 1, "errorCount": 1, "warningCount": 0, "informationCount": 1}
            }
        "#};

        let report = PyrightAdapter::parse_output(output.as_bytes()).unwrap();
        assert_eq!(report.version.as_deref(), Some("1.1.380"));
        assert_eq!(report.general_diagnostics.len(), 2);

        let first = &report.general_diagnostics[0];
        assert_eq!(first.rule.as_deref(), Some("reportMissingImports"));
        let start = first.range.as_ref().and_then(|r| r.start.as_ref()).unwrap();
        assert_eq!(start.line, Some(2));
        assert_eq!(start.character, Some(7));

        assert!(report.general_diagnostics[1].range.is_none());
    }

    #[test]
    fn test_parse_missing_diagnostics_key() {
        let report = PyrightAdapter::parse_output(br#"{"version": "1.1.380"}"#).unwrap();
        assert!(report.general_diagnostics.is_empty());
    }

    #[test]
    fn test_parse_garbage_is_invocation_error() {
        let err = PyrightAdapter::parse_output(b"Traceback (most recent call last)").unwrap_err();
        assert!(matches!(
            err,
            ToolError::Invocation {
                tool: Tool::TypeChecker,
                ..
            }
        ));
    }
}

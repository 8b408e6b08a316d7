//! SARIF 2.1.0 output, one run per tool.

use crate::core::{Diagnostic, Severity, Tool};
use crate::io::output::OutputWriter;
use crate::pipeline::PipelineOutcome;
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::Write;

const SARIF_VERSION: &str = "2.1.0";
const SARIF_SCHEMA: &str = "https://json.schemastore.org/sarif-2.1.0.json";

#[derive(Debug, Serialize)]
pub struct SarifLog {
    #[serde(rename = "$schema")]
    schema: &'static str,
    version: &'static str,
    runs: Vec<SarifRun>,
}

#[derive(Debug, Serialize)]
struct SarifRun {
    tool: SarifTool,
    results: Vec<SarifResult>,
}

#[derive(Debug, Serialize)]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifDriver {
    name: &'static str,
    information_uri: &'static str,
    rules: Vec<SarifRule>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifRule {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    help_uri: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifResult {
    rule_id: String,
    level: &'static str,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
}

#[derive(Debug, Serialize)]
struct SarifMessage {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifLocation {
    physical_location: SarifPhysicalLocation,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifPhysicalLocation {
    artifact_location: SarifArtifactLocation,
    region: SarifRegion,
}

#[derive(Debug, Serialize)]
struct SarifArtifactLocation {
    uri: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifRegion {
    start_line: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_column: Option<u32>,
}

impl SarifLog {
    pub fn from_outcome(outcome: &PipelineOutcome) -> Self {
        let runs = Tool::ALL
            .iter()
            .map(|&tool| {
                let diagnostics: Vec<&Diagnostic> =
                    outcome.run.iter().filter(|d| d.tool() == tool).collect();
                build_run(tool, &diagnostics)
            })
            .collect();

        Self {
            schema: SARIF_SCHEMA,
            version: SARIF_VERSION,
            runs,
        }
    }
}

fn build_run(tool: Tool, diagnostics: &[&Diagnostic]) -> SarifRun {
    let mut seen = BTreeSet::new();
    let rules = diagnostics
        .iter()
        .filter(|d| seen.insert(d.code().to_string()))
        .map(|d| SarifRule {
            id: d.code().to_string(),
            help_uri: d.url().map(str::to_string),
        })
        .collect();

    let results = diagnostics
        .iter()
        .map(|d| SarifResult {
            rule_id: d.code().to_string(),
            level: sarif_level(d.severity()),
            message: SarifMessage {
                text: d.message().to_string(),
            },
            locations: vec![SarifLocation {
                physical_location: SarifPhysicalLocation {
                    artifact_location: SarifArtifactLocation {
                        uri: d.file_path().to_string(),
                    },
                    region: SarifRegion {
                        start_line: d.line(),
                        start_column: d.column(),
                    },
                },
            }],
        })
        .collect();

    SarifRun {
        tool: SarifTool {
            driver: SarifDriver {
                name: tool.engine(),
                information_uri: information_uri(tool),
                rules,
            },
        },
        results,
    }
}

fn sarif_level(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "note",
    }
}

fn information_uri(tool: Tool) -> &'static str {
    match tool {
        Tool::TypeChecker => "https://github.com/microsoft/pyright",
        Tool::Linter => "https://docs.astral.sh/ruff/",
    }
}

pub struct SarifWriter<W: Write> {
    writer: W,
}

impl<W: Write> SarifWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for SarifWriter<W> {
    fn write_outcome(&mut self, outcome: &PipelineOutcome) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&SarifLog::from_outcome(outcome))?;
        self.writer.write_all(json.as_bytes())?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

use crate::core::{Diagnostic, MalformedDiagnostic, RunSummary};
use crate::io::output::OutputWriter;
use crate::pipeline::{PipelineOutcome, RunCondition};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

/// Shape of the `json` output format.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub project_path: String,
    pub timestamp: DateTime<Utc>,
    pub summary: RunSummary,
    pub diagnostics: &'a [Diagnostic],
    pub conditions: &'a [RunCondition],
    pub skipped: &'a [MalformedDiagnostic],
}

impl<'a> JsonReport<'a> {
    pub fn from_outcome(outcome: &'a PipelineOutcome) -> Self {
        Self {
            project_path: outcome.project_root.display().to_string(),
            timestamp: outcome.generated_at,
            summary: outcome.run.summary(),
            diagnostics: outcome.run.diagnostics(),
            conditions: &outcome.conditions,
            skipped: &outcome.skipped,
        }
    }
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_outcome(&mut self, outcome: &PipelineOutcome) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&JsonReport::from_outcome(outcome))?;
        self.writer.write_all(json.as_bytes())?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

use crate::core::Diagnostic;
use crate::formatting::{FormattingConfig, Styler, Symbol};
use crate::io::output::OutputWriter;
use crate::pipeline::PipelineOutcome;
use std::io::Write;

/// Human-readable report grouped by file.
pub struct TerminalWriter<W: Write> {
    writer: W,
    styler: Styler,
}

impl<W: Write> TerminalWriter<W> {
    pub fn new(writer: W, formatting: FormattingConfig) -> Self {
        Self {
            writer,
            styler: Styler::new(formatting),
        }
    }

    fn write_header(&mut self, outcome: &PipelineOutcome) -> anyhow::Result<()> {
        writeln!(
            self.writer,
            "{}",
            self.styler
                .header(&format!("Analysis of {}", outcome.project_root.display()))
        )?;
        writeln!(
            self.writer,
            "{}",
            self.styler.dim(&format!(
                "Generated {}",
                outcome.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
            ))
        )?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_diagnostics(&mut self, outcome: &PipelineOutcome) -> anyhow::Result<()> {
        let mut current_file: Option<&str> = None;
        for diagnostic in &outcome.run {
            if current_file != Some(diagnostic.file_path()) {
                if current_file.is_some() {
                    writeln!(self.writer)?;
                }
                writeln!(self.writer, "{}", self.styler.bold(diagnostic.file_path()))?;
                current_file = Some(diagnostic.file_path());
            }
            self.write_diagnostic(diagnostic)?;
        }
        if current_file.is_some() {
            writeln!(self.writer)?;
        }
        Ok(())
    }

    fn write_diagnostic(&mut self, diagnostic: &Diagnostic) -> anyhow::Result<()> {
        let location = match diagnostic.column() {
            Some(column) => format!("{}:{}", diagnostic.line(), column),
            None => diagnostic.line().to_string(),
        };
        let severity = diagnostic.severity();
        writeln!(
            self.writer,
            "  {:>7}  {} {} {} {}",
            location,
            self.styler.severity(severity, self.styler.severity_symbol(severity)),
            self.styler.severity(severity, severity.as_str()),
            diagnostic.message(),
            self.styler
                .dim(&format!("[{}/{}]", diagnostic.tool().engine(), diagnostic.code())),
        )?;
        if let Some(suggestion) = diagnostic.suggestion() {
            writeln!(
                self.writer,
                "           {} {}",
                self.styler.symbol(Symbol::Fix),
                self.styler.success(suggestion)
            )?;
        }
        Ok(())
    }

    fn write_conditions(&mut self, outcome: &PipelineOutcome) -> anyhow::Result<()> {
        if !outcome.has_conditions() {
            return Ok(());
        }
        writeln!(self.writer, "{}", self.styler.header("Incomplete results"))?;
        for condition in &outcome.conditions {
            writeln!(
                self.writer,
                "  {} {}",
                self.styler.symbol(Symbol::Warning),
                condition
            )?;
        }
        for skipped in &outcome.skipped {
            writeln!(self.writer, "    {}", self.styler.dim(&skipped.to_string()))?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_summary(&mut self, outcome: &PipelineOutcome) -> anyhow::Result<()> {
        let summary = outcome.run.summary();
        if summary.total == 0 {
            writeln!(
                self.writer,
                "{} {}",
                self.styler.symbol(Symbol::Ok),
                self.styler.success("No issues found")
            )?;
            return Ok(());
        }

        writeln!(
            self.writer,
            "{} in {} file(s): {}, {}, {}",
            self.styler.bold(&format!("{} issue(s)", summary.total)),
            summary.by_file.len(),
            self.styler
                .severity(crate::core::Severity::Error, &format!("{} error(s)", summary.errors)),
            self.styler.severity(
                crate::core::Severity::Warning,
                &format!("{} warning(s)", summary.warnings)
            ),
            self.styler
                .severity(crate::core::Severity::Info, &format!("{} info", summary.infos)),
        )?;
        if summary.fixable > 0 {
            writeln!(
                self.writer,
                "{} {} fixable with `pyanalyzer fix`",
                self.styler.symbol(Symbol::Fix),
                summary.fixable
            )?;
        }
        Ok(())
    }
}

impl<W: Write> OutputWriter for TerminalWriter<W> {
    fn write_outcome(&mut self, outcome: &PipelineOutcome) -> anyhow::Result<()> {
        self.write_header(outcome)?;
        self.write_diagnostics(outcome)?;
        self.write_conditions(outcome)?;
        self.write_summary(outcome)?;
        self.writer.flush()?;
        Ok(())
    }
}

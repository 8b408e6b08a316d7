use crate::io::output::OutputWriter;
use crate::pipeline::PipelineOutcome;
use html_escape::encode_text;
use std::io::Write;

const STYLE: &str = r#"
body { font-family: -apple-system, "Segoe UI", sans-serif; margin: 2rem; color: #222; }
h1 { font-size: 1.4rem; }
table { border-collapse: collapse; width: 100%; }
th, td { text-align: left; padding: 0.3rem 0.6rem; border-bottom: 1px solid #ddd; }
.error { color: #b00020; font-weight: bold; }
.warning { color: #a15c00; }
.info { color: #00639b; }
.muted { color: #777; }
.conditions { background: #fff4e5; padding: 0.6rem 1rem; }
"#;

/// Self-contained HTML page; every piece of tool text is escaped.
pub struct HtmlWriter<W: Write> {
    writer: W,
}

impl<W: Write> HtmlWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_summary(&mut self, outcome: &PipelineOutcome) -> anyhow::Result<()> {
        let summary = outcome.run.summary();
        writeln!(
            self.writer,
            "<p>{} issue(s): <span class=\"error\">{} error(s)</span>, \
             <span class=\"warning\">{} warning(s)</span>, \
             <span class=\"info\">{} info</span>, {} fixable</p>",
            summary.total, summary.errors, summary.warnings, summary.infos, summary.fixable
        )?;
        Ok(())
    }

    fn write_conditions(&mut self, outcome: &PipelineOutcome) -> anyhow::Result<()> {
        if !outcome.has_conditions() {
            return Ok(());
        }
        writeln!(self.writer, "<div class=\"conditions\"><strong>Incomplete results</strong><ul>")?;
        for condition in &outcome.conditions {
            writeln!(self.writer, "<li>{}</li>", encode_text(&condition.to_string()))?;
        }
        for skipped in &outcome.skipped {
            writeln!(
                self.writer,
                "<li class=\"muted\">{}</li>",
                encode_text(&skipped.to_string())
            )?;
        }
        writeln!(self.writer, "</ul></div>")?;
        Ok(())
    }

    fn write_table(&mut self, outcome: &PipelineOutcome) -> anyhow::Result<()> {
        if outcome.run.is_empty() {
            writeln!(self.writer, "<p>No issues found.</p>")?;
            return Ok(());
        }
        writeln!(
            self.writer,
            "<table>\n<thead><tr><th>File</th><th>Line</th><th>Severity</th>\
             <th>Code</th><th>Message</th><th>Tool</th></tr></thead>\n<tbody>"
        )?;
        for diagnostic in &outcome.run {
            let location = match diagnostic.column() {
                Some(column) => format!("{}:{}", diagnostic.line(), column),
                None => diagnostic.line().to_string(),
            };
            let suggestion = diagnostic
                .suggestion()
                .map(|s| format!("<br><span class=\"muted\">{}</span>", encode_text(s)))
                .unwrap_or_default();
            writeln!(
                self.writer,
                "<tr><td>{}</td><td>{}</td><td class=\"{}\">{}</td><td>{}</td><td>{}{}</td><td>{}</td></tr>",
                encode_text(diagnostic.file_path()),
                location,
                diagnostic.severity().as_str(),
                diagnostic.severity(),
                encode_text(diagnostic.code()),
                encode_text(diagnostic.message()),
                suggestion,
                diagnostic.tool().engine(),
            )?;
        }
        writeln!(self.writer, "</tbody>\n</table>")?;
        Ok(())
    }
}

impl<W: Write> OutputWriter for HtmlWriter<W> {
    fn write_outcome(&mut self, outcome: &PipelineOutcome) -> anyhow::Result<()> {
        let project = outcome.project_root.display().to_string();
        writeln!(self.writer, "<!DOCTYPE html>")?;
        writeln!(self.writer, "<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">")?;
        writeln!(
            self.writer,
            "<title>pyanalyzer: {}</title>\n<style>{}</style>\n</head>\n<body>",
            encode_text(&project),
            STYLE
        )?;
        writeln!(self.writer, "<h1>Analysis of {}</h1>", encode_text(&project))?;
        writeln!(
            self.writer,
            "<p class=\"muted\">Generated {}</p>",
            outcome.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        self.write_summary(outcome)?;
        self.write_conditions(outcome)?;
        self.write_table(outcome)?;
        writeln!(self.writer, "</body>\n</html>")?;
        self.writer.flush()?;
        Ok(())
    }
}

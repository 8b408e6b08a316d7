pub mod html;
pub mod json;
pub mod sarif;
pub mod terminal;

pub use html::HtmlWriter;
pub use json::{JsonReport, JsonWriter};
pub use sarif::SarifWriter;
pub use terminal::TerminalWriter;

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::core::{Category, Diagnostic, MalformedDiagnostic, Severity, Tool};
    use crate::pipeline::{aggregate, DedupRule, PipelineOutcome, RunCondition};
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;

    pub fn sample_outcome() -> PipelineOutcome {
        let run = aggregate(
            vec![
                vec![Diagnostic::new(
                    Tool::TypeChecker,
                    "pkg/models.py",
                    12,
                    Severity::Error,
                    "reportAttributeAccessIssue",
                    "Cannot access attribute \"<name>\" for class \"Model\"",
                )
                .with_column(5)],
                vec![
                    Diagnostic::new(Tool::Linter, "app.py", 1, Severity::Warning, "F401", "`os` imported but unused")
                        .with_column(8)
                        .with_category(Category::ImportIssue)
                        .with_fixable(true)
                        .with_suggestion(Some("Remove unused import: `os`".to_string()))
                        .with_url(Some("https://docs.astral.sh/ruff/rules/unused-import".to_string())),
                    Diagnostic::new(Tool::Linter, "app.py", 40, Severity::Info, "E501", "Line too long (120 > 88)"),
                ],
            ],
            &DedupRule::Exact,
        );

        PipelineOutcome {
            project_root: PathBuf::from("/work/project"),
            generated_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            run,
            conditions: vec![RunCondition::Malformed {
                tool: Tool::Linter,
                count: 1,
            }],
            skipped: vec![MalformedDiagnostic::missing(Tool::Linter, 3, "filename")],
        }
    }
}

pub mod errors;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub use errors::{ConfigError, MalformedDiagnostic, PipelineError, ToolError};

/// External engine that produced a diagnostic.
///
/// Declaration order is the ordering used when diagnostics share a
/// location: type checker findings sort before linter findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    TypeChecker,
    Linter,
}

impl Tool {
    pub const ALL: [Tool; 2] = [Tool::TypeChecker, Tool::Linter];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TypeChecker => "type_checker",
            Self::Linter => "linter",
        }
    }

    /// Name of the wrapped engine, as shown to users.
    pub fn engine(&self) -> &'static str {
        match self {
            Self::TypeChecker => "pyright",
            Self::Linter => "ruff",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    /// Canonical lookup used by the normalizer. Returns `None` for strings
    /// outside the fixed table.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "error" | "fatal" => Some(Self::Error),
            "warning" | "warn" => Some(Self::Warning),
            "information" | "info" | "hint" | "note" => Some(Self::Info),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    TypeError,
    StyleViolation,
    ImportIssue,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TypeError => "type-error",
            Self::StyleViolation => "style-violation",
            Self::ImportIssue => "import-issue",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One canonical finding.
///
/// Diagnostics are immutable: the `with_*` methods consume the value and
/// return a new one, there is no way to change a diagnostic in place.
/// `file_path` is relative to the project root and `line` is at least 1.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Diagnostic {
    tool: Tool,
    file_path: String,
    line: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    column: Option<u32>,
    severity: Severity,
    category: Category,
    code: String,
    message: String,
    fixable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

impl Diagnostic {
    /// Lines below 1 are clamped to 1.
    pub fn new(
        tool: Tool,
        file_path: impl Into<String>,
        line: u32,
        severity: Severity,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let category = match tool {
            Tool::TypeChecker => Category::TypeError,
            Tool::Linter => Category::StyleViolation,
        };
        Self {
            tool,
            file_path: file_path.into(),
            line: line.max(1),
            column: None,
            severity,
            category,
            code: code.into(),
            message: message.into(),
            fixable: false,
            suggestion: None,
            url: None,
        }
    }

    /// A column of 0 means "unknown".
    pub fn with_column(self, column: u32) -> Self {
        Self {
            column: (column > 0).then_some(column),
            ..self
        }
    }

    pub fn with_category(self, category: Category) -> Self {
        Self { category, ..self }
    }

    pub fn with_fixable(self, fixable: bool) -> Self {
        Self { fixable, ..self }
    }

    pub fn with_suggestion(self, suggestion: Option<String>) -> Self {
        Self { suggestion, ..self }
    }

    pub fn with_url(self, url: Option<String>) -> Self {
        Self { url, ..self }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> Option<u32> {
        self.column
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_fixable(&self) -> bool {
        self.fixable
    }

    pub fn suggestion(&self) -> Option<&str> {
        self.suggestion.as_deref()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Key used for the final ordering of an [`AnalysisRun`].
    pub fn sort_key(&self) -> (&str, u32, u32, Tool) {
        (
            self.file_path.as_str(),
            self.line,
            self.column.unwrap_or(0),
            self.tool,
        )
    }
}

/// Deduplicated, ordered diagnostics for one CLI invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AnalysisRun {
    diagnostics: Vec<Diagnostic>,
}

impl AnalysisRun {
    /// Only the aggregator builds runs from arbitrary lists; it is
    /// responsible for the ordering invariant.
    pub(crate) fn from_sorted(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// New run keeping only diagnostics for which `keep` returns true.
    /// Order is preserved.
    pub fn filtered<F>(&self, keep: F) -> AnalysisRun
    where
        F: Fn(&Diagnostic) -> bool,
    {
        Self {
            diagnostics: self.diagnostics.iter().filter(|d| keep(d)).cloned().collect(),
        }
    }

    /// New run restricted to the given project-relative files.
    pub fn retain_files(&self, files: &BTreeSet<String>) -> AnalysisRun {
        self.filtered(|d| files.contains(d.file_path()))
    }

    pub fn highest_severity(&self) -> Option<Severity> {
        self.diagnostics.iter().map(Diagnostic::severity).max()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary::from_diagnostics(&self.diagnostics)
    }
}

impl<'a> IntoIterator for &'a AnalysisRun {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.iter()
    }
}

/// Summary statistics for a run.
///
/// `errors + warnings + infos == total` always holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
    pub fixable: usize,
    pub by_category: BTreeMap<String, usize>,
    pub by_file: BTreeMap<String, usize>,
    pub by_tool: BTreeMap<String, usize>,
}

impl RunSummary {
    pub fn from_diagnostics(diagnostics: &[Diagnostic]) -> Self {
        diagnostics
            .iter()
            .fold(RunSummary::default(), |mut summary, diagnostic| {
                summary.total += 1;
                match diagnostic.severity() {
                    Severity::Error => summary.errors += 1,
                    Severity::Warning => summary.warnings += 1,
                    Severity::Info => summary.infos += 1,
                }
                if diagnostic.is_fixable() {
                    summary.fixable += 1;
                }
                *summary
                    .by_category
                    .entry(diagnostic.category().to_string())
                    .or_default() += 1;
                *summary
                    .by_file
                    .entry(diagnostic.file_path().to_string())
                    .or_default() += 1;
                *summary
                    .by_tool
                    .entry(diagnostic.tool().to_string())
                    .or_default() += 1;
                summary
            })
    }
}

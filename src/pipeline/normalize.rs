//! Mapping of each tool's raw findings into canonical diagnostics.
//!
//! Field table:
//!
//! | canonical  | pyright                          | ruff                               |
//! |------------|----------------------------------|------------------------------------|
//! | file_path  | `file`                           | `filename`                         |
//! | line       | `range.start.line` + 1           | `location.row`                     |
//! | column     | `range.start.character` + 1      | `location.column`                  |
//! | severity   | `severity`                       | `severity`, else derived from code |
//! | code       | `rule` (default `pyright`)       | `code` (default `syntax-error`)    |
//! | message    | `message`                        | `message`                          |
//! | fixable    | never                            | `fix` present                      |
//! | suggestion | -                                | `fix.message`                      |
//!
//! A finding without a file path or line is skipped and reported as a
//! [`MalformedDiagnostic`]; the remaining findings are still normalized.

use crate::adapters::{PyrightDiagnostic, RawOutput, RuffFinding};
use crate::core::{Category, Diagnostic, MalformedDiagnostic, Severity, Tool};
use std::path::{Component, Path};

const PYRIGHT_DEFAULT_CODE: &str = "pyright";
const RUFF_SYNTAX_ERROR_CODE: &str = "syntax-error";
const RUFF_IMPORT_CODES: &[&str] = &["F401", "F403", "F405", "E401", "E402"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub diagnostics: Vec<Diagnostic>,
    pub skipped: Vec<MalformedDiagnostic>,
}

/// Pure function of its input: one diagnostic per well-formed raw finding.
pub fn normalize(raw: &RawOutput, project_root: &Path) -> Normalized {
    let results: Vec<Result<Diagnostic, MalformedDiagnostic>> = match raw {
        RawOutput::TypeChecker(report) => report
            .general_diagnostics
            .iter()
            .enumerate()
            .map(|(index, finding)| normalize_pyright(index, finding, project_root))
            .collect(),
        RawOutput::Linter(findings) => findings
            .iter()
            .enumerate()
            .map(|(index, finding)| normalize_ruff(index, finding, project_root))
            .collect(),
    };

    results
        .into_iter()
        .fold(Normalized::default(), |mut acc, result| {
            match result {
                Ok(diagnostic) => acc.diagnostics.push(diagnostic),
                Err(malformed) => acc.skipped.push(malformed),
            }
            acc
        })
}

fn normalize_pyright(
    index: usize,
    finding: &PyrightDiagnostic,
    project_root: &Path,
) -> Result<Diagnostic, MalformedDiagnostic> {
    let tool = Tool::TypeChecker;
    let file = required_path(tool, index, finding.file.as_deref(), "file")?;
    let start = finding.range.as_ref().and_then(|range| range.start.as_ref());
    let zero_based_line = start
        .and_then(|pos| pos.line)
        .ok_or_else(|| MalformedDiagnostic::missing(tool, index, "range.start.line"))?;
    let line = one_based(tool, index, zero_based_line.saturating_add(1))?;
    let column = start
        .and_then(|pos| pos.character)
        .and_then(|c| u32::try_from(c.saturating_add(1)).ok())
        .unwrap_or(0);

    let (severity, note) = map_severity(finding.severity.as_deref());
    let code = finding
        .rule
        .as_deref()
        .filter(|rule| !rule.is_empty())
        .unwrap_or(PYRIGHT_DEFAULT_CODE);
    let message = with_note(finding.message.as_deref().unwrap_or_default(), note);

    Ok(
        Diagnostic::new(tool, relativize(file, project_root), line, severity, code, message)
            .with_column(column)
            .with_category(pyright_category(code)),
    )
}

fn normalize_ruff(
    index: usize,
    finding: &RuffFinding,
    project_root: &Path,
) -> Result<Diagnostic, MalformedDiagnostic> {
    let tool = Tool::Linter;
    let file = required_path(tool, index, finding.filename.as_deref(), "filename")?;
    let row = finding
        .location
        .as_ref()
        .and_then(|location| location.row)
        .ok_or_else(|| MalformedDiagnostic::missing(tool, index, "location.row"))?;
    let line = one_based(tool, index, row)?;
    let column = finding
        .location
        .as_ref()
        .and_then(|location| location.column)
        .and_then(|c| u32::try_from(c).ok())
        .unwrap_or(0);

    let code = finding.code.as_deref().filter(|code| !code.is_empty());
    let (severity, note) = match finding.severity.as_deref() {
        Some(raw) => map_severity(Some(raw)),
        // Ruff only reports `code: null` for syntax errors.
        None if code.is_none() => (Severity::Error, None),
        None => (Severity::Warning, None),
    };
    let code = code.unwrap_or(RUFF_SYNTAX_ERROR_CODE);
    let message = with_note(finding.message.as_deref().unwrap_or_default(), note);

    Ok(
        Diagnostic::new(tool, relativize(file, project_root), line, severity, code, message)
            .with_column(column)
            .with_category(ruff_category(code))
            .with_fixable(finding.fix.is_some())
            .with_suggestion(finding.fix.as_ref().and_then(|fix| fix.message.clone()))
            .with_url(finding.url.clone()),
    )
}

fn required_path<'a>(
    tool: Tool,
    index: usize,
    value: Option<&'a str>,
    field: &str,
) -> Result<&'a str, MalformedDiagnostic> {
    value
        .filter(|path| !path.trim().is_empty())
        .ok_or_else(|| MalformedDiagnostic::missing(tool, index, field))
}

fn one_based(tool: Tool, index: usize, line: i64) -> Result<u32, MalformedDiagnostic> {
    u32::try_from(line)
        .ok()
        .filter(|line| *line >= 1)
        .ok_or_else(|| MalformedDiagnostic {
            tool,
            index,
            reason: format!("line {line} is out of range"),
        })
}

/// Fixed severity lookup. Missing and unknown values both become warnings.
/// Only an unknown value carries a note for the message; a missing one
/// leaves the message untouched so it can still match the other tool's.
fn map_severity(raw: Option<&str>) -> (Severity, Option<String>) {
    match raw {
        Some(value) => match Severity::parse(value) {
            Some(severity) => (severity, None),
            None => (
                Severity::Warning,
                Some(format!("unrecognized severity '{value}' mapped to warning")),
            ),
        },
        None => (Severity::Warning, None),
    }
}

fn with_note(message: &str, note: Option<String>) -> String {
    match note {
        Some(note) if message.is_empty() => format!("[{note}]"),
        Some(note) => format!("{message} [{note}]"),
        None => message.to_string(),
    }
}

fn pyright_category(rule: &str) -> Category {
    if rule.contains("Import") || rule == "reportMissingModuleSource" {
        Category::ImportIssue
    } else {
        Category::TypeError
    }
}

fn ruff_category(code: &str) -> Category {
    let isort = code
        .strip_prefix('I')
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()));
    if isort || code.starts_with("TID") || RUFF_IMPORT_CODES.contains(&code) {
        Category::ImportIssue
    } else {
        Category::StyleViolation
    }
}

/// Project-relative, `/`-separated form of a tool-reported path.
///
/// Absolute paths outside the root become `../` paths; a path that cannot
/// be related to the root at all is returned unchanged.
pub fn relativize(path: &str, project_root: &Path) -> String {
    let unified = path.replace('\\', "/");
    let candidate = Path::new(&unified);

    if !candidate.is_absolute() {
        return to_slash(candidate);
    }

    if let Ok(relative) = candidate.strip_prefix(project_root) {
        return to_slash(relative);
    }
    if let Ok(canonical_root) = project_root.canonicalize() {
        if let Ok(relative) = candidate.strip_prefix(&canonical_root) {
            return to_slash(relative);
        }
    }

    match pathdiff::diff_paths(candidate, project_root) {
        Some(relative) if project_root.is_absolute() => to_slash(&relative),
        _ => unified,
    }
}

fn to_slash(path: &Path) -> String {
    path.components()
        .filter(|component| !matches!(component, Component::CurDir))
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

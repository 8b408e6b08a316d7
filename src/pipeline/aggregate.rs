//! Merge, deduplicate and order normalized diagnostics.
//!
//! Two diagnostics are duplicates when they come from different tools,
//! share `file_path` and `line`, and their messages are equivalent under the
//! configured [`DedupRule`]. Findings from the same tool are never merged:
//! `x = foo + foo` legitimately yields two identical messages on one line.
//! Each kept entry absorbs at most one finding per tool. The higher severity
//! wins; on a severity tie the type checker's entry wins, otherwise the
//! first one seen is kept.
//!
//! The result is stably sorted by `(file_path, line, column, tool)`, with
//! an unknown column sorting as 0 and the type checker before the linter.

use crate::core::{AnalysisRun, Diagnostic, Tool};
use std::collections::BTreeMap;

/// How messages from different findings are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum DedupRule {
    /// Byte-equal messages. The only guaranteed behavior.
    #[default]
    Exact,
    /// Best-effort: normalized Levenshtein similarity of lowercased,
    /// whitespace-collapsed messages at or above `threshold` (0.0-1.0).
    /// Within one file/line bucket each finding is compared against the
    /// entries kept so far, so matching is not transitive.
    Fuzzy { threshold: f64 },
}

impl DedupRule {
    pub fn equivalent(&self, a: &str, b: &str) -> bool {
        match self {
            Self::Exact => a == b,
            Self::Fuzzy { threshold } => {
                let (a, b) = (fold_message(a), fold_message(b));
                a == b || strsim::normalized_levenshtein(&a, &b) >= *threshold
            }
        }
    }
}

fn fold_message(message: &str) -> String {
    message
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// A kept diagnostic and the tools whose findings it already stands for.
struct Slot {
    kept: Diagnostic,
    tools: Vec<Tool>,
}

/// Combine one normalized sequence per adapter into an [`AnalysisRun`].
/// Empty input yields an empty run.
pub fn aggregate(inputs: Vec<Vec<Diagnostic>>, rule: &DedupRule) -> AnalysisRun {
    let mut buckets: BTreeMap<(String, u32), Vec<Slot>> = BTreeMap::new();
    for diagnostic in inputs.into_iter().flatten() {
        let key = (diagnostic.file_path().to_string(), diagnostic.line());
        let slots = buckets.entry(key).or_default();
        merge_into(slots, diagnostic, rule);
    }

    let mut diagnostics: Vec<Diagnostic> = buckets
        .into_values()
        .flatten()
        .map(|slot| slot.kept)
        .collect();
    diagnostics.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    AnalysisRun::from_sorted(diagnostics)
}

fn merge_into(slots: &mut Vec<Slot>, candidate: Diagnostic, rule: &DedupRule) {
    let matching = slots.iter_mut().find(|slot| {
        !slot.tools.contains(&candidate.tool())
            && rule.equivalent(slot.kept.message(), candidate.message())
    });
    match matching {
        Some(slot) => {
            slot.tools.push(candidate.tool());
            if outranks(&candidate, &slot.kept) {
                slot.kept = candidate;
            }
        }
        None => slots.push(Slot {
            tools: vec![candidate.tool()],
            kept: candidate,
        }),
    }
}

fn outranks(candidate: &Diagnostic, incumbent: &Diagnostic) -> bool {
    candidate.severity() > incumbent.severity()
        || (candidate.severity() == incumbent.severity()
            && candidate.tool() == Tool::TypeChecker
            && incumbent.tool() != Tool::TypeChecker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Severity;
    use pretty_assertions::assert_eq;

    fn diag(tool: Tool, file: &str, line: u32, severity: Severity, message: &str) -> Diagnostic {
        Diagnostic::new(tool, file, line, severity, "C", message)
    }

    #[test]
    fn test_empty_input_is_empty_run() {
        assert!(aggregate(Vec::new(), &DedupRule::Exact).is_empty());
        assert!(aggregate(vec![Vec::new(), Vec::new()], &DedupRule::Exact).is_empty());
    }

    #[test]
    fn test_higher_severity_wins() {
        let run = aggregate(
            vec![
                vec![diag(Tool::TypeChecker, "a.py", 10, Severity::Warning, "X")],
                vec![diag(Tool::Linter, "a.py", 10, Severity::Error, "X")],
            ],
            &DedupRule::Exact,
        );
        assert_eq!(run.len(), 1);
        assert_eq!(run.diagnostics()[0].tool(), Tool::Linter);
        assert_eq!(run.diagnostics()[0].severity(), Severity::Error);
    }

    #[test]
    fn test_tie_keeps_type_checker_regardless_of_input_order() {
        for inputs in [
            vec![
                vec![diag(Tool::Linter, "a.py", 1, Severity::Warning, "X")],
                vec![diag(Tool::TypeChecker, "a.py", 1, Severity::Warning, "X")],
            ],
            vec![
                vec![diag(Tool::TypeChecker, "a.py", 1, Severity::Warning, "X")],
                vec![diag(Tool::Linter, "a.py", 1, Severity::Warning, "X")],
            ],
        ] {
            let run = aggregate(inputs, &DedupRule::Exact);
            assert_eq!(run.len(), 1);
            assert_eq!(run.diagnostics()[0].tool(), Tool::TypeChecker);
        }
    }

    #[test]
    fn test_different_messages_are_not_duplicates() {
        let run = aggregate(
            vec![
                vec![diag(Tool::TypeChecker, "a.py", 1, Severity::Error, "X")],
                vec![diag(Tool::Linter, "a.py", 1, Severity::Warning, "Y")],
            ],
            &DedupRule::Exact,
        );
        assert_eq!(run.len(), 2);
    }

    #[test]
    fn test_different_lines_are_not_duplicates() {
        let run = aggregate(
            vec![vec![
                diag(Tool::Linter, "a.py", 1, Severity::Warning, "X"),
                diag(Tool::Linter, "a.py", 2, Severity::Warning, "X"),
            ]],
            &DedupRule::Exact,
        );
        assert_eq!(run.len(), 2);
    }

    #[test]
    fn test_same_tool_findings_are_never_merged() {
        let run = aggregate(
            vec![vec![
                diag(Tool::TypeChecker, "a.py", 1, Severity::Error, "\"foo\" is not defined")
                    .with_column(5),
                diag(Tool::TypeChecker, "a.py", 1, Severity::Error, "\"foo\" is not defined")
                    .with_column(11),
            ]],
            &DedupRule::Exact,
        );

        assert_eq!(run.len(), 2);
        let columns: Vec<_> = run.iter().map(|d| d.column()).collect();
        assert_eq!(columns, vec![Some(5), Some(11)]);
    }

    #[test]
    fn test_each_entry_absorbs_one_finding_per_tool() {
        let run = aggregate(
            vec![
                vec![diag(Tool::TypeChecker, "a.py", 1, Severity::Warning, "X")],
                vec![
                    diag(Tool::Linter, "a.py", 1, Severity::Warning, "X"),
                    diag(Tool::Linter, "a.py", 1, Severity::Warning, "X"),
                ],
            ],
            &DedupRule::Exact,
        );

        let tools: Vec<_> = run.iter().map(|d| d.tool()).collect();
        assert_eq!(tools, vec![Tool::TypeChecker, Tool::Linter]);
    }

    #[test]
    fn test_ordering_key() {
        let run = aggregate(
            vec![
                vec![
                    diag(Tool::Linter, "b.py", 1, Severity::Warning, "L1"),
                    diag(Tool::Linter, "a.py", 5, Severity::Warning, "L2").with_column(3),
                    diag(Tool::Linter, "a.py", 5, Severity::Warning, "L3"),
                ],
                vec![
                    diag(Tool::TypeChecker, "a.py", 5, Severity::Error, "T1").with_column(3),
                    diag(Tool::TypeChecker, "a.py", 2, Severity::Error, "T2"),
                ],
            ],
            &DedupRule::Exact,
        );

        let messages: Vec<_> = run.iter().map(|d| d.message()).collect();
        assert_eq!(messages, vec!["T2", "L3", "T1", "L2", "L1"]);
    }

    #[test]
    fn test_fuzzy_rule_matches_near_identical_messages() {
        let rule = DedupRule::Fuzzy { threshold: 0.9 };
        assert!(rule.equivalent("Undefined name `foo`", "undefined  name `foo`"));
        assert!(rule.equivalent(
            "\"foo\" is not defined",
            "\"foo\" is not defined."
        ));
        assert!(!rule.equivalent("Undefined name `foo`", "Line too long (120 > 88)"));
        assert!(!DedupRule::Exact.equivalent("a", "A"));
    }

    #[test]
    fn test_fuzzy_aggregation() {
        let run = aggregate(
            vec![
                vec![diag(Tool::TypeChecker, "a.py", 3, Severity::Error, "\"foo\" is not defined")],
                vec![diag(Tool::Linter, "a.py", 3, Severity::Error, "\"foo\" is not defined.")],
            ],
            &DedupRule::Fuzzy { threshold: 0.9 },
        );
        assert_eq!(run.len(), 1);
        assert_eq!(run.diagnostics()[0].tool(), Tool::TypeChecker);
    }

    #[test]
    fn test_aggregate_is_deterministic() {
        let inputs = || {
            vec![
                vec![
                    diag(Tool::TypeChecker, "z.py", 4, Severity::Info, "A"),
                    diag(Tool::TypeChecker, "a.py", 4, Severity::Error, "B"),
                ],
                vec![
                    diag(Tool::Linter, "a.py", 4, Severity::Warning, "B"),
                    diag(Tool::Linter, "m.py", 1, Severity::Warning, "C"),
                ],
            ]
        };
        assert_eq!(
            aggregate(inputs(), &DedupRule::Exact),
            aggregate(inputs(), &DedupRule::Exact)
        );
    }
}

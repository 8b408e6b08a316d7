//! Property tests for merging tool output into an `AnalysisRun`.

use proptest::prelude::*;
use pyanalyzer::core::{Diagnostic, Severity, Tool};
use pyanalyzer::pipeline::{aggregate, DedupRule};
use std::collections::{BTreeMap, BTreeSet};

fn severity_strategy() -> impl Strategy<Value = Severity> {
    prop_oneof![
        Just(Severity::Error),
        Just(Severity::Warning),
        Just(Severity::Info)
    ]
}

fn diagnostic_strategy(tool: Tool) -> impl Strategy<Value = Diagnostic> {
    (
        prop::sample::select(vec!["app.py", "pkg/models.py", "pkg/views.py"]),
        1u32..6,
        0u32..4,
        severity_strategy(),
        prop::sample::select(vec!["unused import", "line too long", "possibly unbound"]),
    )
        .prop_map(move |(file, line, column, severity, message)| {
            Diagnostic::new(tool, file, line, severity, "X001", message).with_column(column)
        })
}

type Key = (String, u32, String);

fn key(d: &Diagnostic) -> Key {
    (d.file_path().to_string(), d.line(), d.message().to_string())
}

fn count_by_key<'a>(diagnostics: impl Iterator<Item = &'a Diagnostic>) -> BTreeMap<Key, usize> {
    let mut counts = BTreeMap::new();
    for d in diagnostics {
        *counts.entry(key(d)).or_insert(0) += 1;
    }
    counts
}

fn contributions() -> impl Strategy<Value = Vec<Vec<Diagnostic>>> {
    (
        prop::collection::vec(diagnostic_strategy(Tool::TypeChecker), 0..20),
        prop::collection::vec(diagnostic_strategy(Tool::Linter), 0..20),
    )
        .prop_map(|(type_checker, linter)| vec![type_checker, linter])
}

proptest! {
    #[test]
    fn prop_run_is_sorted(input in contributions()) {
        let run = aggregate(input, &DedupRule::Exact);
        let keys: Vec<_> = run.iter().map(|d| d.sort_key()).collect();
        prop_assert!(keys.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn prop_only_cross_tool_duplicates_merge(input in contributions()) {
        let per_tool: Vec<_> = input.iter().map(|c| count_by_key(c.iter())).collect();
        let run = aggregate(input, &DedupRule::Exact);
        for (k, kept) in count_by_key(run.iter()) {
            let busiest_tool = per_tool
                .iter()
                .map(|counts| counts.get(&k).copied().unwrap_or(0))
                .max()
                .unwrap_or(0);
            prop_assert_eq!(kept, busiest_tool, "{:?}", k);
        }
    }

    #[test]
    fn prop_single_tool_output_is_never_merged(
        findings in prop::collection::vec(diagnostic_strategy(Tool::Linter), 0..30)
    ) {
        let expected = findings.len();
        let run = aggregate(vec![findings], &DedupRule::Fuzzy { threshold: 0.5 });
        prop_assert_eq!(run.len(), expected);
    }

    #[test]
    fn prop_every_location_is_kept(input in contributions()) {
        let expected: BTreeSet<Key> = input.iter().flatten().map(key).collect();
        let run = aggregate(input, &DedupRule::Exact);
        let actual: BTreeSet<Key> = run.iter().map(key).collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn prop_highest_severity_survives(input in contributions()) {
        let highest = |diagnostics: Vec<&Diagnostic>| {
            let mut by_key: BTreeMap<Key, Severity> = BTreeMap::new();
            for d in diagnostics {
                let entry = by_key.entry(key(d)).or_insert(d.severity());
                *entry = (*entry).max(d.severity());
            }
            by_key
        };
        let expected = highest(input.iter().flatten().collect());
        let run = aggregate(input, &DedupRule::Exact);
        prop_assert_eq!(highest(run.iter().collect()), expected);
    }

    #[test]
    fn prop_aggregation_is_deterministic(input in contributions()) {
        let first = aggregate(input.clone(), &DedupRule::Exact);
        let second = aggregate(input, &DedupRule::Exact);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_summary_counts_add_up(input in contributions()) {
        let summary = aggregate(input, &DedupRule::Fuzzy { threshold: 0.8 }).summary();
        prop_assert_eq!(summary.errors + summary.warnings + summary.infos, summary.total);
        prop_assert_eq!(summary.by_file.values().sum::<usize>(), summary.total);
        prop_assert_eq!(summary.by_tool.values().sum::<usize>(), summary.total);
    }
}

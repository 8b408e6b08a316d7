//! Panic hook that prints a structured crash report to stderr.
//!
//! The report names the phase and tool recorded in
//! [`context`](super::context) for the panicking thread.

use super::context::{get_current_context, get_progress, AnalysisContext};
use std::panic::PanicHookInfo;
use tracing::Span;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const RULE: &str = "================================================================";

/// Install early in `main`, before any tool runs.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        eprint!("{}", crash_report(info));
    }));
}

fn crash_report(info: &PanicHookInfo<'_>) -> String {
    let context = get_current_context();
    let (finished, total) = get_progress();

    let mut report = String::new();
    report.push('\n');
    report.push_str(RULE);
    report.push_str("\npyanalyzer crash report\n");
    report.push_str(RULE);
    report.push('\n');
    report.push_str(&format!("version:  {VERSION}\n"));
    report.push_str(&format!("platform: {}\n", std::env::consts::OS));
    report.push_str(&format!(
        "time:     {}\n",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    report.push_str(&format!("panic:    {}\n", panic_message(info)));
    if let Some(location) = info.location() {
        report.push_str(&format!(
            "location: {}:{}:{}\n",
            location.file(),
            location.line(),
            location.column()
        ));
    }
    report.push_str(&context_lines(&context, finished, total));

    if std::env::var("RUST_BACKTRACE").is_ok() {
        report.push_str(&format!("\n{}\n", std::backtrace::Backtrace::capture()));
    } else {
        report.push_str("Run with RUST_BACKTRACE=1 for a stack trace\n");
    }
    report.push_str(RULE);
    report.push('\n');
    report
}

fn context_lines(context: &AnalysisContext, finished: usize, total: usize) -> String {
    let mut lines = String::new();
    match context.phase {
        Some(phase) => lines.push_str(&format!("phase:    {phase}\n")),
        None => lines.push_str("phase:    (before analysis started)\n"),
    }
    if let Some(metadata) = Span::current().metadata() {
        lines.push_str(&format!("span:     {}\n", metadata.name()));
    }
    if let Some(tool) = context.tool {
        lines.push_str(&format!("tool:     {tool} ({})\n", tool.engine()));
    }
    if total > 0 {
        lines.push_str(&format!("progress: {finished} / {total} tools finished\n"));
    }
    lines
}

fn panic_message(info: &PanicHookInfo<'_>) -> String {
    if let Some(s) = info.payload().downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = info.payload().downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

//! Thread-local context tracking for crash reports.
//!
//! Each thread records the phase it is in and the tool it is driving, so a
//! panic inside a rayon worker still reports what that worker was doing.
//! Global progress counts finished tool invocations.

use crate::core::Tool;
use std::cell::RefCell;
use std::sync::atomic::{AtomicUsize, Ordering};

static TOOLS_FINISHED: AtomicUsize = AtomicUsize::new(0);
static TOOLS_TOTAL: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    static CURRENT_CONTEXT: RefCell<AnalysisContext> = const { RefCell::new(AnalysisContext::new()) };
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisContext {
    pub phase: Option<AnalysisPhase>,
    pub tool: Option<Tool>,
}

impl AnalysisContext {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: None,
            tool: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisPhase {
    /// Config, virtualenv and changed-file discovery
    Discovery,
    /// Waiting on an external tool
    ToolInvocation,
    Normalization,
    Aggregation,
    Rendering,
    /// Backups and the linter's own fixer
    Fixing,
}

impl std::fmt::Display for AnalysisPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Discovery => "discovery",
            Self::ToolInvocation => "tool_invocation",
            Self::Normalization => "normalization",
            Self::Aggregation => "aggregation",
            Self::Rendering => "rendering",
            Self::Fixing => "fixing",
        };
        f.write_str(name)
    }
}

/// Restores the previous context when dropped.
pub struct ContextGuard {
    previous: AnalysisContext,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        CURRENT_CONTEXT.with(|ctx| {
            *ctx.borrow_mut() = self.previous.clone();
        });
    }
}

fn update(change: impl FnOnce(&mut AnalysisContext)) -> ContextGuard {
    CURRENT_CONTEXT.with(|ctx| {
        let previous = ctx.borrow().clone();
        change(&mut ctx.borrow_mut());
        ContextGuard { previous }
    })
}

/// Set the current phase until the returned guard drops.
#[must_use]
pub fn set_phase(phase: AnalysisPhase) -> ContextGuard {
    update(|ctx| ctx.phase = Some(phase))
}

/// Set the tool being driven by this thread until the guard drops.
#[must_use]
pub fn set_current_tool(tool: Tool) -> ContextGuard {
    update(|ctx| ctx.tool = Some(tool))
}

pub fn set_progress(finished: usize, total: usize) {
    TOOLS_FINISHED.store(finished, Ordering::Relaxed);
    TOOLS_TOTAL.store(total, Ordering::Relaxed);
}

pub fn increment_processed() {
    TOOLS_FINISHED.fetch_add(1, Ordering::Relaxed);
}

#[must_use]
pub fn get_current_context() -> AnalysisContext {
    CURRENT_CONTEXT.with(|ctx| ctx.borrow().clone())
}

/// `(finished, total)` tool invocations.
#[must_use]
pub fn get_progress() -> (usize, usize) {
    (
        TOOLS_FINISHED.load(Ordering::Relaxed),
        TOOLS_TOTAL.load(Ordering::Relaxed),
    )
}

//! Logging setup and crash-report context.
//!
//! ```ignore
//! use pyanalyzer::observability::{set_phase, AnalysisPhase};
//!
//! let _phase = set_phase(AnalysisPhase::Aggregation);
//! // a panic here reports the aggregation phase
//! ```

pub mod context;
pub mod panic_hook;
pub mod tracing;

pub use context::{
    get_current_context, get_progress, increment_processed, set_current_tool, set_phase,
    set_progress, AnalysisContext, AnalysisPhase, ContextGuard,
};
pub use panic_hook::install_panic_hook;
pub use self::tracing::init_tracing;

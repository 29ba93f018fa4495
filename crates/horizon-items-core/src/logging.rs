//! Logging facilities for Horizon Items.
//!
//! Horizon Items uses the `tracing` crate for instrumentation and never
//! installs a subscriber itself. To see logs, install one in your
//! application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_items=debug")
//!     .init();
//! ```
//!
//! Every subsystem logs under one of the [`targets`] so it can be filtered
//! independently.

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "horizon_items_core";
    /// UI execution context target.
    pub const UI_CONTEXT: &str = "horizon_items_core::ui_context";
    /// Push delivery (publishers and subjects) target.
    pub const PUBLISHER: &str = "horizon_items_core::publisher";
    /// Pull delivery (sequence bridge) target.
    pub const SEQUENCE: &str = "horizon_items_core::sequence";
    /// Items update controller target.
    pub const CONTROLLER: &str = "horizon_items::controller";
    /// Diff engine target.
    pub const DIFF: &str = "horizon_items::diff";
    /// View attachment target.
    pub const BINDING: &str = "horizon_items::binding";
}

/// A guard that keeps a tracing span entered for the duration of one
/// snapshot application.
///
/// Create it at the top of an update and let it drop when the update is
/// done; subscribers that record span timings get per-update durations.
#[derive(Debug)]
pub struct UpdateSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl UpdateSpan {
    /// Enter a new update span.
    ///
    /// `generation` is the ordinal of the snapshot being applied.
    pub fn new(generation: u64) -> Self {
        let span = tracing::debug_span!(target: targets::CONTROLLER, "apply_snapshot", generation);
        Self {
            span: span.entered(),
        }
    }
}

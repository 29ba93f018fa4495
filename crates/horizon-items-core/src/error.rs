//! Error types for Horizon Items.
//!
//! Snapshot delivery itself never fails: a missing view is a no-op and a
//! failing pull is treated as end of sequence. The errors here only cover
//! setup operations that genuinely can fail.

/// Result type alias for Horizon Items operations.
pub type Result<T> = std::result::Result<T, ItemsError>;

/// The main error type for Horizon Items setup operations.
#[derive(Debug, thiserror::Error)]
pub enum ItemsError {
    /// The UI execution context could not be created.
    #[error("UI context error: {0}")]
    UiContext(#[from] UiContextError),

    /// The consuming side of a snapshot channel has been dropped.
    #[error("snapshot stream has been closed")]
    StreamClosed,
}

/// Errors raised while building the UI execution context.
#[derive(Debug, thiserror::Error)]
pub enum UiContextError {
    /// The underlying runtime could not be built.
    #[error("failed to create UI context runtime: {0}")]
    CreationFailed(#[source] std::io::Error),
}

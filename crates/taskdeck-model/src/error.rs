//! Error types for TaskDeck payloads

/// Errors raised while interpreting user-supplied model values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Status string is not one of the board columns
    #[error("unknown task status: '{0}' (expected todo, in-progress or completed)")]
    UnknownStatus(String),

    /// Priority string is not a known level
    #[error("unknown priority: '{0}' (expected low, medium or high)")]
    UnknownPriority(String),
}

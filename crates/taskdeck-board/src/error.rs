//! Board error types

use crate::drag::{DragEvent, DragState};
use taskdeck_model::TaskStatus;
use taskdeck_query::{MutationError, QueryError};

/// Board errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum BoardError {
    /// Event not accepted in the current drag state
    #[error("illegal drag transition: {event:?} while {state:?}")]
    IllegalTransition {
        /// State at the time
        state: DragState,
        /// Rejected event
        event: DragEvent,
    },

    /// Drop target has no column on the board
    #[error("no column for status {0}")]
    UnknownColumn(TaskStatus),

    /// Loading the board failed
    #[error(transparent)]
    Query(#[from] QueryError),

    /// The status update failed
    #[error(transparent)]
    Mutation(#[from] MutationError),
}

impl BoardError {
    /// Message for display
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::IllegalTransition { .. } => "That move is not possible right now".to_string(),
            Self::UnknownColumn(_) => "There is no column for that status".to_string(),
            Self::Query(e) => e.user_message(),
            Self::Mutation(e) => e.message(),
        }
    }
}

//! Application error type
//!
//! Wraps each layer's error so callers can match on where a failure came
//! from while still getting one display message.

use taskdeck_board::BoardError;
use taskdeck_gateway::GatewayError;
use taskdeck_local::LocalStoreError;
use taskdeck_query::{MutationError, QueryError};

/// Top-level TaskDeck error
#[derive(Debug, thiserror::Error)]
pub enum TaskDeckError {
    /// Invalid or unreadable configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Gateway failure outside the cache
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// A cached read failed
    #[error(transparent)]
    Query(#[from] QueryError),

    /// A write failed
    #[error(transparent)]
    Mutation(#[from] MutationError),

    /// Board interaction failed
    #[error(transparent)]
    Board(#[from] BoardError),

    /// Local storage failed
    #[error(transparent)]
    Store(#[from] LocalStoreError),
}

impl TaskDeckError {
    /// Check if the user may simply try again
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Gateway(e) => e.is_retryable(),
            Self::Query(e) => e.gateway_error().is_some_and(GatewayError::is_retryable),
            Self::Mutation(e) | Self::Board(BoardError::Mutation(e)) => e.is_retryable(),
            Self::Board(BoardError::Query(e)) => {
                e.gateway_error().is_some_and(GatewayError::is_retryable)
            }
            Self::Config(_) | Self::Board(_) | Self::Store(_) => false,
        }
    }

    /// Check if the session is missing or expired
    #[must_use]
    pub fn is_auth(&self) -> bool {
        match self {
            Self::Gateway(e) => e.is_auth(),
            Self::Query(e) | Self::Board(BoardError::Query(e)) => {
                e.gateway_error().is_some_and(GatewayError::is_auth)
            }
            Self::Mutation(MutationError::Auth) | Self::Board(BoardError::Mutation(MutationError::Auth)) => true,
            _ => false,
        }
    }

    /// Message for display
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(message) => format!("Configuration problem: {message}"),
            Self::Gateway(e) => e.user_message(),
            Self::Query(e) => e.user_message(),
            Self::Mutation(e) => e.message(),
            Self::Board(e) => e.user_message(),
            Self::Store(e) => format!("Could not save locally: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskdeck_query::QueryKey;

    #[test]
    fn classifies_nested_failures() {
        let query = TaskDeckError::from(QueryError::Fetch {
            key: QueryKey::new("me"),
            source: GatewayError::Auth,
        });
        assert!(query.is_auth());
        assert!(!query.is_retryable());

        let write = TaskDeckError::from(MutationError::Network {
            message: "offline".into(),
        });
        assert!(write.is_retryable());
        assert!(!write.is_auth());

        let board = TaskDeckError::from(BoardError::Mutation(MutationError::Auth));
        assert!(board.is_auth());
    }
}

//! Error types for queries and mutations

use crate::key::QueryKey;
use taskdeck_gateway::GatewayError;

/// Query cache errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum QueryError {
    /// The fetch for a key failed; the error is stored on the entry
    #[error("fetch failed for {key}: {source}")]
    Fetch {
        /// Key being fetched
        key: QueryKey,
        /// Gateway failure
        #[source]
        source: GatewayError,
    },

    /// A key was read with a different value type than it was fetched with
    #[error("cached value for {key} is not a {expected}")]
    TypeMismatch {
        /// Key being read
        key: QueryKey,
        /// Requested type
        expected: &'static str,
    },
}

impl QueryError {
    /// Underlying gateway failure, if any
    #[inline]
    #[must_use]
    pub fn gateway_error(&self) -> Option<&GatewayError> {
        match self {
            Self::Fetch { source, .. } => Some(source),
            Self::TypeMismatch { .. } => None,
        }
    }

    /// Key the error belongs to
    #[inline]
    #[must_use]
    pub fn key(&self) -> &QueryKey {
        match self {
            Self::Fetch { key, .. } | Self::TypeMismatch { key, .. } => key,
        }
    }

    /// Message for an error placeholder
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Fetch { source, .. } => source.user_message(),
            Self::TypeMismatch { .. } => taskdeck_gateway::GENERIC_FAILURE.to_string(),
        }
    }
}

/// Mutation failures, each carrying a message fit for display
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MutationError {
    /// Server rejected the input (4xx)
    #[error("{message}")]
    Validation {
        /// Display message
        message: String,
    },

    /// Domain-specific write conflict (409)
    #[error("{message}")]
    Conflict {
        /// Display message
        message: String,
    },

    /// Transport failure or timeout
    #[error("{message}")]
    Network {
        /// Display message
        message: String,
    },

    /// Session expired
    #[error("your session has expired")]
    Auth,

    /// Server failure (5xx)
    #[error("{message}")]
    Server {
        /// Display message
        message: String,
    },

    /// Write went through but the response was unreadable
    #[error("{message}")]
    Decode {
        /// Display message
        message: String,
    },

    /// Re-submission while the same mutation is pending
    #[error("{label} is already in progress")]
    InFlight {
        /// Mutation label
        label: String,
    },
}

impl MutationError {
    /// Classify a gateway failure, preferring the server's message over `fallback`
    #[must_use]
    pub fn from_gateway(err: &GatewayError, fallback: &str) -> Self {
        let message = err.server_message().unwrap_or(fallback).to_string();
        match err {
            GatewayError::Validation { .. } => Self::Validation { message },
            GatewayError::Conflict(_) => Self::Conflict { message },
            GatewayError::Network(_) => Self::Network { message },
            GatewayError::Auth => Self::Auth,
            GatewayError::Decode { .. } => Self::Decode { message },
            GatewayError::Server { .. } | GatewayError::Config(_) => Self::Server { message },
        }
    }

    /// Message for a notification
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Check if the user may simply try again
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Server { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutation_error_prefers_server_message() {
        let err = GatewayError::from_status(422, r#"{"message":"Title is required"}"#);
        let mutation = MutationError::from_gateway(&err, "Update failed");
        assert_eq!(
            mutation,
            MutationError::Validation {
                message: "Title is required".to_string()
            }
        );
    }

    #[test]
    fn mutation_error_falls_back() {
        let err = GatewayError::from_status(500, "");
        let mutation = MutationError::from_gateway(&err, "Delete failed");
        assert_eq!(mutation.message(), "Delete failed");
        assert!(mutation.is_retryable());

        let err = GatewayError::Network("connection reset".to_string());
        let mutation = MutationError::from_gateway(&err, "Delete failed");
        assert!(matches!(mutation, MutationError::Network { .. }));
    }

    #[test]
    fn conflict_is_not_retryable() {
        let err = GatewayError::from_status(409, r#"{"message":"Task was modified"}"#);
        let mutation = MutationError::from_gateway(&err, "Save failed");
        assert_eq!(mutation.message(), "Task was modified");
        assert!(!mutation.is_retryable());
    }

    #[test]
    fn query_error_exposes_gateway_error() {
        let err = QueryError::Fetch {
            key: QueryKey::new("projects"),
            source: GatewayError::Auth,
        };
        assert_eq!(err.gateway_error(), Some(&GatewayError::Auth));
        assert_eq!(err.key().resource(), "projects");
    }
}

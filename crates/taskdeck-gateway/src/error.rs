//! Error types for the gateway
//!
//! Every failed request resolves to exactly one [`GatewayError`] variant:
//! - transport failures and timeouts → `Network`
//! - 401 → `Auth` (also fires the session-expired redirect)
//! - 409 → `Conflict`
//! - other 4xx → `Validation`
//! - 5xx → `Server`
//! - 2xx with an unexpected body shape → `Decode`

use serde::Deserialize;

/// Generic text used when the server gives no message
pub const GENERIC_FAILURE: &str = "Something went wrong";

/// Generic text for rejected requests without a server message
pub const GENERIC_REJECTION: &str = "The request was rejected";

/// Gateway error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// Transport failure, timeout or unreadable response
    #[error("network error: {0}")]
    Network(String),

    /// Session missing or expired (HTTP 401)
    #[error("not authenticated")]
    Auth,

    /// Request rejected by the server (4xx other than 401/409)
    #[error("validation failed ({status}): {message}")]
    Validation {
        /// HTTP status
        status: u16,
        /// Server-provided or generic message
        message: String,
    },

    /// Domain-specific write conflict (HTTP 409)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Server failure (5xx)
    #[error("server error ({status}): {message}")]
    Server {
        /// HTTP status
        status: u16,
        /// Server-provided or generic message
        message: String,
    },

    /// Successful response whose payload does not match the expected type
    #[error("unexpected response from {path}: {message}")]
    Decode {
        /// Request path
        path: String,
        /// Decoder message
        message: String,
    },

    /// Gateway could not be constructed
    #[error("gateway configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl GatewayError {
    /// Classify a non-success HTTP response
    #[must_use]
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = server_message(body);
        match status {
            401 => Self::Auth,
            409 => Self::Conflict(message.unwrap_or_else(|| GENERIC_REJECTION.to_string())),
            400..=499 => Self::Validation {
                status,
                message: message.unwrap_or_else(|| GENERIC_REJECTION.to_string()),
            },
            _ => Self::Server {
                status,
                message: message.unwrap_or_else(|| GENERIC_FAILURE.to_string()),
            },
        }
    }

    /// Create decode error for path
    pub fn decode(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Message suitable for showing to the user
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => "Network error, check your connection".to_string(),
            Self::Auth => "Your session has expired".to_string(),
            Self::Validation { message, .. } | Self::Server { message, .. } => message.clone(),
            Self::Conflict(message) => message.clone(),
            Self::Decode { .. } | Self::Config(_) => GENERIC_FAILURE.to_string(),
        }
    }

    /// Server-provided message, if the server sent one
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Validation { message, .. } | Self::Server { message, .. }
                if message != GENERIC_FAILURE && message != GENERIC_REJECTION =>
            {
                Some(message)
            }
            Self::Conflict(message) if message != GENERIC_REJECTION => Some(message),
            _ => None,
        }
    }

    /// Check if a caller-level retry could succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Server { .. })
    }

    /// Check if this is an authentication failure
    #[inline]
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth)
    }
}

fn server_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
}

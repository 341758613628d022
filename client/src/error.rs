//! Error types for client operations.

use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Error taxonomy shared by every component of the client.
///
/// Pre-network failures (`Validation`, `Unauthenticated`) never reach the
/// server. `Network` means no response was received, `Api` means the server
/// answered with a non-2xx status.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    // ═══════════════════════════════════════════════════════════
    // Pre-flight Errors
    // ═══════════════════════════════════════════════════════════

    /// Input rejected locally before any request was made.
    #[error("{message}")]
    Validation {
        /// Human readable reason
        message: String,
    },

    /// The operation requires a signed-in session and there is none.
    #[error("Not authenticated. Sign in to continue.")]
    Unauthenticated,

    // ═══════════════════════════════════════════════════════════
    // Remote Errors
    // ═══════════════════════════════════════════════════════════

    /// No response was received.
    #[error("Network error: {message}")]
    Network {
        /// Transport level description
        message: String,
    },

    /// The server rejected the request.
    #[error("{message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Server message, or a generic description when the body had none
        message: String,
    },

    /// A successful response did not have the expected shape.
    #[error("Unexpected response: {message}")]
    Schema {
        /// What did not match
        message: String,
    },

    // ═══════════════════════════════════════════════════════════
    // Local Errors
    // ═══════════════════════════════════════════════════════════

    /// Reading or writing durable storage failed.
    #[error("Storage error: {message}")]
    Storage {
        /// Underlying I/O or encoding failure
        message: String,
    },

    /// The controller runtime refused the operation.
    #[error("Client is shutting down")]
    ShuttingDown,

    /// The request ran but its outcome was not observed; reload to see the result.
    #[error("The result of this request was lost. Reload to see the current state.")]
    OutcomeLost,
}

impl ClientError {
    /// Build a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Build a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Build a schema error.
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    /// Build a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Whether this failure means the credential is no longer accepted.
    #[must_use]
    pub const fn is_session_invalidating(&self) -> bool {
        matches!(self, Self::Api { status: 401, .. })
    }

    /// Whether the user can fix this by changing their input.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// HTTP status for server rejections.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Text to show the user.
    ///
    /// Server messages are passed through verbatim.
    #[must_use]
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(error: serde_json::Error) -> Self {
        Self::schema(error.to_string())
    }
}

impl From<staybook_runtime::StoreError> for ClientError {
    fn from(error: staybook_runtime::StoreError) -> Self {
        tracing::warn!(%error, "Controller store rejected an action");
        match error {
            staybook_runtime::StoreError::Lagged(_) => Self::OutcomeLost,
            _ => Self::ShuttingDown,
        }
    }
}

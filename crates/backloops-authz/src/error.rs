//! Error types for the authorization client.

/// Errors raised below the decision layer.
///
/// Only the policy transport produces these. The decision entry points
/// absorb every variant and answer with a denial.
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Network failure talking to the policy engine (connect, timeout,
    /// unusable endpoint, body read).
    #[error("transport error: {message}")]
    Transport { message: String },

    /// The HTTP client could not be built from the configuration.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl AuthzError {
    /// Whether the error came from the network rather than local setup.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

impl From<reqwest::Error> for AuthzError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport {
            message: err.to_string(),
        }
    }
}

/// Result type for authorization operations.
pub type AuthzResult<T> = Result<T, AuthzError>;

//! Error types for OAuth operations

/// Errors from token lifecycle operations.
///
/// None of these are retried inside the crate; retry policy belongs to the
/// caller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("authorization failed: state {received:?} does not match {expected:?}")]
    CsrfMismatch { expected: String, received: String },

    #[error("token exchange failed: {message}")]
    TokenExchange {
        /// HTTP status from the token endpoint, if a response was received
        status: Option<u16>,
        message: String,
    },

    #[error("endpoint request failed ({status}): {message}")]
    Endpoint { status: u16, message: String },

    /// A token or client id that cannot be sent as an HTTP header value
    #[error("invalid header value: {0}")]
    InvalidHeader(String),
}

impl Error {
    pub(crate) fn token_exchange(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::TokenExchange {
            status,
            message: message.into(),
        }
    }
}

/// Result alias for OAuth operations.
pub type Result<T> = std::result::Result<T, Error>;

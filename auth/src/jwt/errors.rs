use thiserror::Error;

/// Error type for token codec operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Token is invalid: {0}")]
    InvalidToken(String),

    /// Signature, structure and not-before all passed, but `exp` is at or
    /// before the current instant.
    #[error("Token is expired")]
    TokenExpired,

    #[error("Invalid token lifetime: {0} seconds")]
    InvalidLifetime(i64),
}

use std::time::Duration;

use auth::JwtError;
use auth::PasswordError;
use thiserror::Error;

/// Top-level error for account, token and provider operations.
///
/// Store and codec errors reach the provider layer unchanged. The only
/// translation happens inside `authenticate`, where `NotFound` becomes
/// `InvalidCredentials`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Wrong username, wrong password or unsupported credential kind.
    /// Deliberately carries no detail.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Malformed, mis-signed, not-yet-valid or revoked token.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Structurally valid token past its expiry.
    #[error("Token is expired")]
    Expired,

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Token encoding failed: {0}")]
    TokenEncoding(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Infrastructure errors
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Operation exceeded its deadline of {0:?}")]
    DeadlineExceeded(Duration),
}

impl AuthError {
    /// Whether the error means the caller is not authenticated.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials | AuthError::InvalidToken(_) | AuthError::Expired
        )
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::InvalidToken(reason) => AuthError::InvalidToken(reason),
            JwtError::TokenExpired => AuthError::Expired,
            JwtError::EncodingFailed(reason) => AuthError::TokenEncoding(reason),
            JwtError::InvalidLifetime(seconds) => {
                AuthError::Configuration(format!("token lifetime of {} seconds", seconds))
            }
        }
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        AuthError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        AuthError::Serialization(err.to_string())
    }
}

use std::sync::OnceLock;

use chrono::Duration;

use crate::jwt::Claims;
use crate::jwt::JwtError;
use crate::jwt::TokenCodec;
use crate::password::PasswordError;
use crate::password::PasswordHasher;
use crate::password::PasswordPolicy;

/// Authentication coordinator combining password verification and token
/// handling.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    password_policy: Option<PasswordPolicy>,
    codec: TokenCodec,
    decoy_hash: OnceLock<String>,
}

/// Plaintext behind the hash verified when no account matches.
const DECOY_PASSWORD: &str = "decoy-password-for-unknown-accounts";

/// Authentication operation errors.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("JWT error: {0}")]
    JwtError(#[from] JwtError),
}

impl Authenticator {
    /// Create a new authenticator with the default hasher and password policy.
    ///
    /// # Arguments
    /// * `secret` - Secret key for token signing
    /// * `lifetime` - Lifetime of issued tokens
    ///
    /// # Errors
    /// * `InvalidLifetime` - Lifetime is outside what the codec accepts
    pub fn new(secret: &[u8], lifetime: Duration) -> Result<Self, JwtError> {
        Ok(Self {
            password_hasher: PasswordHasher::new(),
            password_policy: Some(PasswordPolicy::default()),
            codec: TokenCodec::new(secret, lifetime)?,
            decoy_hash: OnceLock::new(),
        })
    }

    /// Replace the password hasher.
    pub fn with_password_hasher(mut self, password_hasher: PasswordHasher) -> Self {
        self.password_hasher = password_hasher;
        self.decoy_hash = OnceLock::new();
        self
    }

    /// Replace the password policy; `None` accepts any password.
    pub fn with_password_policy(mut self, password_policy: Option<PasswordPolicy>) -> Self {
        self.password_policy = password_policy;
        self
    }

    /// Lifetime stamped onto issued tokens.
    pub fn token_lifetime(&self) -> Duration {
        self.codec.lifetime()
    }

    /// Check a password against the policy and hash it for storage.
    ///
    /// # Errors
    /// * `PolicyViolation` - Password does not satisfy the policy
    /// * `HashingFailed` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        if let Some(policy) = &self.password_policy {
            policy.check(password)?;
        }
        self.password_hasher.hash(password)
    }

    /// Verify a plaintext password against a stored hash.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match
    /// * `PasswordError` - Stored hash could not be parsed
    pub fn verify_password(
        &self,
        stored_hash: &str,
        password: &str,
    ) -> Result<(), AuthenticationError> {
        if self.password_hasher.verify(stored_hash, password)? {
            Ok(())
        } else {
            Err(AuthenticationError::InvalidCredentials)
        }
    }

    /// Spend the same work as [`Authenticator::verify_password`] when there is
    /// no stored hash to check, so a missing account costs as much as a wrong
    /// password. The outcome is discarded.
    ///
    /// # Errors
    /// * `HashingFailed` - The decoy hash could not be produced
    pub fn verify_decoy(&self, password: &str) -> Result<(), PasswordError> {
        let decoy = match self.decoy_hash.get() {
            Some(hash) => hash,
            None => {
                let hash = self.password_hasher.hash(DECOY_PASSWORD)?;
                self.decoy_hash.get_or_init(|| hash)
            }
        };

        let _ = self.password_hasher.verify(decoy, password);
        Ok(())
    }

    /// Decoy hash, once [`Authenticator::verify_decoy`] has produced it.
    pub fn decoy_hash(&self) -> Option<&str> {
        self.decoy_hash.get().map(String::as_str)
    }

    /// Issue a signed token for identity claims.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token generation failed
    pub fn issue_token(&self, claims: &Claims) -> Result<String, JwtError> {
        self.codec.issue(claims)
    }

    /// Validate and decode a token.
    ///
    /// # Errors
    /// * `InvalidToken` - Token is malformed, mis-signed, or not yet valid
    /// * `TokenExpired` - Token is otherwise valid but past its expiry
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.codec.decode(token)
    }

    /// Decode a token without rejecting it for being expired.
    ///
    /// # Errors
    /// * `InvalidToken` - Token is malformed, mis-signed, or not yet valid
    pub fn inspect_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.codec.decode_allow_expired(token)
    }
}

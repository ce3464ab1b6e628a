//! Session token and credential primitives.
//!
//! Provides the building blocks used by authentication providers:
//! - Password hashing and verification (Argon2id) with a password policy
//! - Session token issuance and validation (HS256 signed JWT)
//! - Authentication coordination
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::with_cost(8, 1, 1).unwrap();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify(&hash, "my_password").unwrap());
//! ```
//!
//! ## Session Tokens
//! ```
//! use auth::{Claims, TokenCodec};
//! use chrono::Duration;
//!
//! let codec = TokenCodec::new(b"secret_key_at_least_32_bytes_long!", Duration::hours(1)).unwrap();
//! let claims = Claims::for_subject("user123").with_provider("local");
//! let token = codec.issue(&claims).unwrap();
//! let decoded = codec.decode(&token).unwrap();
//! assert_eq!(decoded.sub, "user123");
//! assert!(decoded.exp > decoded.iat);
//! ```

pub mod authenticator;
pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::Authenticator;
pub use jwt::Claims;
pub use jwt::JwtError;
pub use jwt::TokenCodec;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use password::PasswordPolicy;

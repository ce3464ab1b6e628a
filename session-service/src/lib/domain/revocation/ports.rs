use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::errors::AuthError;

/// Record of token identifiers invalidated before their natural expiry.
///
/// A record only matters until its expiry instant. Once that instant is
/// reached the record is logically absent, whether or not a sweep has
/// physically removed it yet.
#[async_trait]
pub trait RevocationStore: Send + Sync + 'static {
    /// Check whether a token identifier is currently revoked.
    ///
    /// # Returns
    /// `false` for unknown identifiers and for records at or past their expiry
    ///
    /// # Errors
    /// * `Database` - Backend failure
    async fn is_revoked(&self, token_id: &str) -> Result<bool, AuthError>;

    /// Mark a token identifier as revoked until `expires_at`.
    ///
    /// Idempotent: revoking a live record again is a no-op and never errors.
    /// A record that is already logically absent is replaced.
    ///
    /// # Returns
    /// `true` if this call wrote the record, `false` if a live record was
    /// already present. Of several concurrent calls for one identifier, at
    /// most one sees `true`.
    ///
    /// # Errors
    /// * `Database` - Backend failure
    async fn revoke(&self, token_id: &str, expires_at: DateTime<Utc>)
        -> Result<bool, AuthError>;

    /// Remove every record whose expiry is at or before now.
    ///
    /// # Returns
    /// Number of records removed
    ///
    /// # Errors
    /// * `Database` - Backend failure
    async fn sweep_expired(&self) -> Result<u64, AuthError>;
}

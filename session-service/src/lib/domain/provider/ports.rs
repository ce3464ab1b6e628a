use async_trait::async_trait;

use crate::domain::account::models::AuthenticatedUser;
use crate::domain::errors::AuthError;
use crate::domain::provider::models::Credentials;

/// Contract every authentication provider implements.
///
/// The registry stores providers as `Arc<dyn Provider>`; callers never see
/// the concrete type.
#[async_trait]
pub trait Provider: Send + Sync + 'static {
    /// Unique name the provider is registered under.
    fn name(&self) -> &str;

    /// Whether `revoke_token` actually invalidates tokens.
    ///
    /// Providers without a revocation list accept `revoke_token` as a no-op;
    /// callers that need logout to stick must check this.
    fn supports_revocation(&self) -> bool;

    /// Verify credentials.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unsupported kind, unknown user or wrong password
    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthenticatedUser, AuthError>;

    /// Resolve a bearer token to the account it was issued for.
    ///
    /// # Errors
    /// * `InvalidToken` - Malformed, mis-signed, not yet valid or revoked
    /// * `Expired` - Otherwise valid but past its expiry
    /// * `NotFound` - Token is valid but its account is gone
    async fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;

    /// Issue a replacement for `token`.
    ///
    /// With an empty `token` this is the login path: a brand-new token is
    /// issued for `identity`, which must then be present.
    ///
    /// # Errors
    /// * `InvalidToken` - Token is invalid, or empty without an identity
    /// * `Expired` - Token is expired and the provider cannot refresh it
    async fn refresh_token(
        &self,
        token: &str,
        identity: Option<&AuthenticatedUser>,
    ) -> Result<String, AuthError>;

    /// Invalidate `token` before its natural expiry, where supported.
    async fn revoke_token(&self, token: &str) -> Result<(), AuthError>;

    /// Issue a fresh token for an authenticated user.
    async fn issue_token(&self, user: &AuthenticatedUser) -> Result<String, AuthError> {
        self.refresh_token("", Some(user)).await
    }
}

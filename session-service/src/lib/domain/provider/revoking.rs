use std::sync::Arc;

use async_trait::async_trait;
use auth::Claims;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::account::models::AccountId;
use crate::domain::account::models::AuthenticatedUser;
use crate::domain::account::ports::AccountStore;
use crate::domain::errors::AuthError;
use crate::domain::provider::deadline::with_deadline;
use crate::domain::provider::local::LocalProvider;
use crate::domain::provider::models::Credentials;
use crate::domain::provider::ports::Provider;
use crate::domain::revocation::ports::RevocationStore;

/// Key a token is revoked under: its `jti`, or the raw token when the claim
/// set carries none.
fn revocation_key<'a>(claims: &'a Claims, token: &'a str) -> &'a str {
    if claims.jti.is_empty() {
        token
    } else {
        &claims.jti
    }
}

/// [`LocalProvider`] decorated with a revocation list.
///
/// Revoked tokens fail validation as `InvalidToken` even while their
/// signature and expiry are fine. Refresh and revoke accept expired tokens
/// but never structurally invalid ones.
pub struct RevokingProvider<S, R>
where
    S: AccountStore,
    R: RevocationStore + ?Sized,
{
    inner: LocalProvider<S>,
    revocations: Arc<R>,
}

impl<S, R> RevokingProvider<S, R>
where
    S: AccountStore,
    R: RevocationStore + ?Sized,
{
    pub fn new(inner: LocalProvider<S>, revocations: Arc<R>) -> Self {
        Self { inner, revocations }
    }

    pub fn inner(&self) -> &LocalProvider<S> {
        &self.inner
    }

    /// Instant until which a revocation record for `claims` must live.
    fn record_expiry(&self, claims: &Claims) -> DateTime<Utc> {
        DateTime::from_timestamp(claims.exp, 0)
            .unwrap_or_else(|| Utc::now() + self.inner.authenticator().token_lifetime())
    }

    async fn ensure_not_revoked(&self, key: &str) -> Result<(), AuthError> {
        let revoked =
            with_deadline(self.inner.deadline(), self.revocations.is_revoked(key)).await?;
        if revoked {
            return Err(AuthError::InvalidToken("token has been revoked".to_string()));
        }
        Ok(())
    }

    /// Revoke the token `claims` came from.
    ///
    /// Returns `false` when a live record already existed, meaning another
    /// caller revoked it first.
    async fn revoke_claims(&self, claims: &Claims, token: &str) -> Result<bool, AuthError> {
        let key = revocation_key(claims, token);
        let expires_at = self.record_expiry(claims);

        let written = with_deadline(
            self.inner.deadline(),
            self.revocations.revoke(key, expires_at),
        )
        .await?;

        if written {
            tracing::info!(
                provider = %self.inner.name(),
                token_id = %claims.jti,
                account_id = %claims.sub,
                expires_at = %expires_at,
                "Token revoked"
            );
        }
        Ok(written)
    }
}

#[async_trait]
impl<S, R> Provider for RevokingProvider<S, R>
where
    S: AccountStore,
    R: RevocationStore + ?Sized,
{
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn supports_revocation(&self) -> bool {
        true
    }

    async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthenticatedUser, AuthError> {
        self.inner.authenticate(credentials).await
    }

    async fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let claims = self.inner.authenticator().validate_token(token)?;
        self.ensure_not_revoked(revocation_key(&claims, token)).await?;
        self.inner.load_user(&AccountId::new(claims.sub.as_str())).await
    }

    async fn refresh_token(
        &self,
        token: &str,
        identity: Option<&AuthenticatedUser>,
    ) -> Result<String, AuthError> {
        if token.is_empty() {
            return self.inner.refresh_token(token, identity).await;
        }

        let claims = self.inner.authenticator().inspect_token(token)?;

        // Refresh is single-use: only the caller whose revocation lands
        // gets a successor. A logged-out token never does.
        self.ensure_not_revoked(revocation_key(&claims, token)).await?;
        if !self.revoke_claims(&claims, token).await? {
            return Err(AuthError::InvalidToken("token has been revoked".to_string()));
        }

        let user = self.inner.load_user(&AccountId::new(claims.sub.as_str())).await?;
        self.inner.issue_for(&user, claims.extra)
    }

    async fn revoke_token(&self, token: &str) -> Result<(), AuthError> {
        let claims = self.inner.authenticator().inspect_token(token)?;
        self.revoke_claims(&claims, token).await?;
        Ok(())
    }
}

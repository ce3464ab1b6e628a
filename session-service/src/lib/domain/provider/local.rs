use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::Authenticator;
use auth::Claims;

use crate::domain::account::models::AccountId;
use crate::domain::account::models::AuthenticatedUser;
use crate::domain::account::models::NewAccount;
use crate::domain::account::ports::AccountStore;
use crate::domain::errors::AuthError;
use crate::domain::provider::deadline::with_deadline;
use crate::domain::provider::models::CredentialKind;
use crate::domain::provider::models::Credentials;
use crate::domain::provider::ports::Provider;

/// Name the local provider registers under unless renamed.
pub const LOCAL_PROVIDER: &str = "local";

/// Username/password provider backed by an [`AccountStore`].
///
/// Holds no state of its own beyond its collaborators. It cannot revoke
/// tokens; wrap it in
/// [`RevokingProvider`](crate::domain::provider::revoking::RevokingProvider)
/// for that.
pub struct LocalProvider<S>
where
    S: AccountStore,
{
    name: String,
    store: Arc<S>,
    authenticator: Arc<Authenticator>,
    deadline: Option<Duration>,
}

impl<S> LocalProvider<S>
where
    S: AccountStore,
{
    /// Create a provider named [`LOCAL_PROVIDER`].
    ///
    /// # Arguments
    /// * `store` - Account persistence implementation
    /// * `authenticator` - Password verification and token signing
    pub fn new(store: Arc<S>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            name: LOCAL_PROVIDER.to_string(),
            store,
            authenticator,
            deadline: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Bound every store call by `deadline`; `None` waits indefinitely.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Load the projection of the account a token was issued for.
    ///
    /// # Errors
    /// * `NotFound` - Account no longer exists
    /// * `DeadlineExceeded` - Store did not answer in time
    pub async fn load_user(&self, id: &AccountId) -> Result<AuthenticatedUser, AuthError> {
        let account = with_deadline(self.deadline, self.store.get_by_id(id)).await?;
        Ok(AuthenticatedUser::from(&account))
    }

    /// Sign a token for `user`, carrying `extra` as custom claims.
    pub fn issue_for(
        &self,
        user: &AuthenticatedUser,
        extra: HashMap<String, serde_json::Value>,
    ) -> Result<String, AuthError> {
        let mut claims = Claims::for_subject(user.id.as_str())
            .with_roles(user.roles.iter().cloned())
            .with_email(user.email.as_str())
            .with_name(user.username.as_str())
            .with_provider(self.name.as_str());
        claims.extra = extra;

        Ok(self.authenticator.issue_token(&claims)?)
    }

    /// Create an account from a plaintext password.
    ///
    /// The password is checked against the authenticator's policy and
    /// hashed before it reaches the store.
    ///
    /// # Errors
    /// * `Password` - Password violates the policy or hashing failed
    /// * `AlreadyExists` - Username or email is taken
    pub async fn register<I, R>(
        &self,
        username: &str,
        email: &str,
        password: &str,
        roles: I,
    ) -> Result<AuthenticatedUser, AuthError>
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        let password_hash = self.authenticator.hash_password(password)?;
        let account = NewAccount::new(username, email, password_hash).with_roles(roles);

        let created = with_deadline(self.deadline, self.store.create(account)).await?;
        tracing::info!(
            provider = %self.name,
            account_id = %created.id,
            username = %created.username,
            "Account registered"
        );

        Ok(AuthenticatedUser::from(&created))
    }
}

#[async_trait]
impl<S> Provider for LocalProvider<S>
where
    S: AccountStore,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_revocation(&self) -> bool {
        false
    }

    async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthenticatedUser, AuthError> {
        if credentials.kind != CredentialKind::Password {
            tracing::warn!(
                provider = %self.name,
                kind = %credentials.kind,
                "Authentication rejected: unsupported credential kind"
            );
            return Err(AuthError::InvalidCredentials);
        }

        let account = match with_deadline(
            self.deadline,
            self.store.get_by_username(&credentials.username),
        )
        .await
        {
            Ok(account) => account,
            Err(AuthError::NotFound(_)) => {
                if let Err(e) = self.authenticator.verify_decoy(&credentials.password) {
                    tracing::warn!(provider = %self.name, error = %e, "Decoy hash unavailable");
                }
                tracing::warn!(provider = %self.name, "Authentication failed");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        match self
            .authenticator
            .verify_password(&account.password_hash, &credentials.password)
        {
            Ok(()) => Ok(AuthenticatedUser::from(&account)),
            Err(AuthenticationError::InvalidCredentials) => {
                tracing::warn!(provider = %self.name, "Authentication failed");
                Err(AuthError::InvalidCredentials)
            }
            Err(AuthenticationError::PasswordError(e)) => {
                tracing::warn!(
                    provider = %self.name,
                    account_id = %account.id,
                    error = %e,
                    "Stored password hash is unreadable"
                );
                Err(AuthError::InvalidCredentials)
            }
            Err(AuthenticationError::JwtError(e)) => Err(e.into()),
        }
    }

    async fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let claims = self.authenticator.validate_token(token)?;
        self.load_user(&AccountId::new(claims.sub)).await
    }

    async fn refresh_token(
        &self,
        token: &str,
        identity: Option<&AuthenticatedUser>,
    ) -> Result<String, AuthError> {
        if token.is_empty() {
            let user = identity.ok_or_else(|| {
                AuthError::InvalidToken("no token and no identity to issue for".to_string())
            })?;
            return self.issue_for(user, HashMap::new());
        }

        let claims = self.authenticator.validate_token(token)?;
        let user = self.load_user(&AccountId::new(claims.sub.as_str())).await?;
        self.issue_for(&user, claims.extra)
    }

    async fn revoke_token(&self, _token: &str) -> Result<(), AuthError> {
        tracing::debug!(provider = %self.name, "Revocation not supported, ignoring");
        Ok(())
    }
}

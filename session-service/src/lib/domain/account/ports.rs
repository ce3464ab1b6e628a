use async_trait::async_trait;

use crate::domain::account::models::Account;
use crate::domain::account::models::AccountId;
use crate::domain::account::models::NewAccount;
use crate::domain::errors::AuthError;

/// Persistence operations for accounts.
///
/// Implementations must be observably identical: same error kinds, same
/// uniqueness scope (exact, case-sensitive match on username and email), and
/// same timestamp behavior. Returned records are owned copies; mutating them
/// never affects the store.
///
/// Cancelling (dropping) a returned future abandons the operation; a
/// create or update that has not committed leaves no trace.
#[async_trait]
pub trait AccountStore: Send + Sync + 'static {
    /// Retrieve account by identifier.
    ///
    /// # Errors
    /// * `NotFound` - No account with this identifier
    /// * `Database` - Backend failure
    async fn get_by_id(&self, id: &AccountId) -> Result<Account, AuthError>;

    /// Retrieve account by username.
    ///
    /// # Errors
    /// * `NotFound` - No account with this username
    /// * `Database` - Backend failure
    async fn get_by_username(&self, username: &str) -> Result<Account, AuthError>;

    /// Retrieve account by email address.
    ///
    /// # Errors
    /// * `NotFound` - No account with this email
    /// * `Database` - Backend failure
    async fn get_by_email(&self, email: &str) -> Result<Account, AuthError>;

    /// Persist a new account.
    ///
    /// Assigns an identifier when none is given and stamps `created_at` and
    /// `updated_at` with the current second.
    ///
    /// # Returns
    /// The stored account, carrying the assigned identifier
    ///
    /// # Errors
    /// * `AlreadyExists` - Username, email or identifier is taken
    /// * `Database` - Backend failure
    async fn create(&self, account: NewAccount) -> Result<Account, AuthError>;

    /// Replace an existing account.
    ///
    /// Keeps the stored `created_at`, refreshes `updated_at`, and replaces
    /// roles and metadata wholesale.
    ///
    /// # Returns
    /// The stored account after the update
    ///
    /// # Errors
    /// * `NotFound` - Account does not exist
    /// * `AlreadyExists` - New username or email belongs to another account
    /// * `Database` - Backend failure
    async fn update(&self, account: Account) -> Result<Account, AuthError>;

    /// Remove an account together with its roles and metadata.
    ///
    /// # Errors
    /// * `NotFound` - Account does not exist
    /// * `Database` - Backend failure
    async fn delete(&self, id: &AccountId) -> Result<(), AuthError>;
}

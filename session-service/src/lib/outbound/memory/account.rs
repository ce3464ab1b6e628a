use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::account::models::Account;
use crate::domain::account::models::AccountId;
use crate::domain::account::models::NewAccount;
use crate::domain::account::ports::AccountStore;
use crate::domain::errors::AuthError;

/// In-process account store.
///
/// Suitable for development and tests. All three indexes sit behind one
/// lock so they can never drift apart.
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    inner: RwLock<Indexes>,
}

#[derive(Debug, Default)]
struct Indexes {
    accounts: HashMap<AccountId, Account>,
    usernames: HashMap<String, AccountId>,
    emails: HashMap<String, AccountId>,
}

impl Indexes {
    fn lookup(&self, id: Option<&AccountId>, key: &str) -> Result<Account, AuthError> {
        id.and_then(|id| self.accounts.get(id))
            .cloned()
            .ok_or_else(|| AuthError::NotFound(key.to_string()))
    }

    /// Whether `key` in `index` belongs to an account other than `owner`.
    fn taken_by_other(index: &HashMap<String, AccountId>, key: &str, owner: &AccountId) -> bool {
        index.get(key).is_some_and(|holder| holder != owner)
    }
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts.
    pub async fn len(&self) -> usize {
        self.inner.read().await.accounts.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn get_by_id(&self, id: &AccountId) -> Result<Account, AuthError> {
        let inner = self.inner.read().await;
        inner.lookup(Some(id), id.as_str())
    }

    async fn get_by_username(&self, username: &str) -> Result<Account, AuthError> {
        let inner = self.inner.read().await;
        inner.lookup(inner.usernames.get(username), username)
    }

    async fn get_by_email(&self, email: &str) -> Result<Account, AuthError> {
        let inner = self.inner.read().await;
        inner.lookup(inner.emails.get(email), email)
    }

    async fn create(&self, account: NewAccount) -> Result<Account, AuthError> {
        let mut inner = self.inner.write().await;

        if inner.usernames.contains_key(&account.username) {
            return Err(AuthError::AlreadyExists(format!("username {}", account.username)));
        }
        if inner.emails.contains_key(&account.email) {
            return Err(AuthError::AlreadyExists(format!("email {}", account.email)));
        }

        let id = account.id.clone().unwrap_or_else(AccountId::generate);
        if inner.accounts.contains_key(&id) {
            return Err(AuthError::AlreadyExists(format!("account {}", id)));
        }

        let stored = account.into_account(id.clone(), Utc::now().timestamp());
        inner.usernames.insert(stored.username.clone(), id.clone());
        inner.emails.insert(stored.email.clone(), id.clone());
        inner.accounts.insert(id, stored.clone());

        Ok(stored)
    }

    async fn update(&self, mut account: Account) -> Result<Account, AuthError> {
        let mut inner = self.inner.write().await;

        let existing = inner
            .accounts
            .get(&account.id)
            .ok_or_else(|| AuthError::NotFound(account.id.to_string()))?;
        let old_username = existing.username.clone();
        let old_email = existing.email.clone();
        let created_at = existing.created_at;

        // Validate both keys before touching any index.
        if Indexes::taken_by_other(&inner.usernames, &account.username, &account.id) {
            return Err(AuthError::AlreadyExists(format!("username {}", account.username)));
        }
        if Indexes::taken_by_other(&inner.emails, &account.email, &account.id) {
            return Err(AuthError::AlreadyExists(format!("email {}", account.email)));
        }

        if old_username != account.username {
            inner.usernames.remove(&old_username);
            inner
                .usernames
                .insert(account.username.clone(), account.id.clone());
        }
        if old_email != account.email {
            inner.emails.remove(&old_email);
            inner.emails.insert(account.email.clone(), account.id.clone());
        }

        account.created_at = created_at;
        account.updated_at = Utc::now().timestamp();
        inner.accounts.insert(account.id.clone(), account.clone());

        Ok(account)
    }

    async fn delete(&self, id: &AccountId) -> Result<(), AuthError> {
        let mut inner = self.inner.write().await;

        let removed = inner
            .accounts
            .remove(id)
            .ok_or_else(|| AuthError::NotFound(id.to_string()))?;
        inner.usernames.remove(&removed.username);
        inner.emails.remove(&removed.email);

        Ok(())
    }
}

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::errors::AuthError;
use crate::domain::revocation::ports::RevocationStore;

/// In-process revocation list keyed by token identifier.
///
/// Stale records are dropped as soon as a lookup notices them, so the map
/// stays bounded even when no sweeper runs.
#[derive(Debug, Default)]
pub struct MemoryRevocationStore {
    revoked: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl MemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of physically stored records, live or stale.
    pub async fn len(&self) -> usize {
        self.revoked.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Lookup as of `now`.
    pub async fn is_revoked_at(&self, token_id: &str, now: DateTime<Utc>) -> bool {
        let expires_at = match self.revoked.read().await.get(token_id) {
            Some(expires_at) => *expires_at,
            None => return false,
        };

        if expires_at > now {
            return true;
        }

        // A concurrent revoke may have replaced the record while the read
        // lock was released.
        let mut revoked = self.revoked.write().await;
        if revoked.get(token_id).is_some_and(|expires_at| *expires_at <= now) {
            revoked.remove(token_id);
        }
        false
    }

    /// Revoke as of `now`; `true` if the record was written.
    pub async fn revoke_at(
        &self,
        token_id: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> bool {
        let mut revoked = self.revoked.write().await;
        match revoked.get(token_id) {
            Some(existing) if *existing > now => false,
            _ => {
                revoked.insert(token_id.to_string(), expires_at);
                true
            }
        }
    }

    /// Sweep as of `now`.
    pub async fn sweep_expired_at(&self, now: DateTime<Utc>) -> u64 {
        let mut revoked = self.revoked.write().await;
        let before = revoked.len();
        revoked.retain(|_, expires_at| *expires_at > now);
        (before - revoked.len()) as u64
    }
}

#[async_trait]
impl RevocationStore for MemoryRevocationStore {
    async fn is_revoked(&self, token_id: &str) -> Result<bool, AuthError> {
        Ok(self.is_revoked_at(token_id, Utc::now()).await)
    }

    async fn revoke(
        &self,
        token_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, AuthError> {
        Ok(self.revoke_at(token_id, expires_at, Utc::now()).await)
    }

    async fn sweep_expired(&self) -> Result<u64, AuthError> {
        Ok(self.sweep_expired_at(Utc::now()).await)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[tokio::test]
    async fn test_revoke_and_check() {
        let store = MemoryRevocationStore::new();
        let now = Utc::now();

        store.revoke_at("jti-1", now + Duration::hours(1), now).await;
        assert!(store.is_revoked_at("jti-1", now).await);
        assert!(!store.is_revoked_at("jti-2", now).await);
    }

    #[tokio::test]
    async fn test_stale_record_is_dropped_on_lookup() {
        let store = MemoryRevocationStore::new();
        let now = Utc::now();

        store.revoke_at("jti-1", now, now - Duration::seconds(5)).await;
        assert_eq!(store.len().await, 1);

        // Expiry equal to the lookup instant counts as expired.
        assert!(!store.is_revoked_at("jti-1", now).await);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_revoke_is_first_write_wins_while_live() {
        let store = MemoryRevocationStore::new();
        let now = Utc::now();

        assert!(store.revoke_at("jti-1", now + Duration::hours(1), now).await);
        assert!(!store.revoke_at("jti-1", now + Duration::seconds(1), now).await);

        assert!(store.is_revoked_at("jti-1", now + Duration::minutes(30)).await);
    }

    #[tokio::test]
    async fn test_revoke_replaces_stale_record() {
        let store = MemoryRevocationStore::new();
        let now = Utc::now();

        store.revoke_at("jti-1", now - Duration::seconds(1), now).await;
        assert!(store.revoke_at("jti-1", now + Duration::hours(1), now).await);

        assert!(store.is_revoked_at("jti-1", now).await);
    }

    #[tokio::test]
    async fn test_sweep_boundary() {
        let store = MemoryRevocationStore::new();
        let now = Utc::now();
        let earlier = now - Duration::hours(1);

        store.revoke_at("past", now - Duration::seconds(1), earlier).await;
        store.revoke_at("boundary", now, earlier).await;
        store.revoke_at("future", now + Duration::seconds(1), earlier).await;

        assert_eq!(store.sweep_expired_at(now).await, 2);
        assert_eq!(store.len().await, 1);
        assert!(store.is_revoked_at("future", now).await);
        assert_eq!(store.sweep_expired_at(now).await, 0);
    }
}

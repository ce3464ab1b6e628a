use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;

use crate::domain::errors::AuthError;
use crate::domain::revocation::ports::RevocationStore;

/// PostgreSQL revocation list.
///
/// Lookups filter out expired rows themselves, so correctness does not
/// depend on how often [`RevocationStore::sweep_expired`] runs. The
/// application clock is bound into every query so that both backends agree
/// on what "now" means.
pub struct PostgresRevocationStore {
    pool: PgPool,
}

impl PostgresRevocationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Sweep as of `now`.
    pub async fn sweep_expired_at(&self, now: DateTime<Utc>) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Number of physically stored rows, live or stale.
    pub async fn count(&self) -> Result<i64, AuthError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM revoked_tokens")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[async_trait]
impl RevocationStore for PostgresRevocationStore {
    async fn is_revoked(&self, token_id: &str) -> Result<bool, AuthError> {
        let revoked: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM revoked_tokens WHERE token_id = $1 AND expires_at > $2
            )
            "#,
        )
        .bind(token_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(revoked)
    }

    async fn revoke(
        &self,
        token_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, AuthError> {
        // A live row is left alone; a row already past its expiry is
        // logically absent and gets replaced.
        let result = sqlx::query(
            r#"
            INSERT INTO revoked_tokens (token_id, expires_at)
            VALUES ($1, $2)
            ON CONFLICT (token_id) DO UPDATE
            SET expires_at = EXCLUDED.expires_at, revoked_at = now()
            WHERE revoked_tokens.expires_at <= $3
            "#,
        )
        .bind(token_id)
        .bind(expires_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn sweep_expired(&self) -> Result<u64, AuthError> {
        self.sweep_expired_at(Utc::now()).await
    }
}

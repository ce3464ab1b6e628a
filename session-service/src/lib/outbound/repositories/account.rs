use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::PgPool;
use sqlx::Postgres;
use sqlx::Transaction;

use crate::domain::account::models::Account;
use crate::domain::account::models::AccountId;
use crate::domain::account::models::Metadata;
use crate::domain::account::models::NewAccount;
use crate::domain::account::ports::AccountStore;
use crate::domain::errors::AuthError;

/// Account row joined with its role and metadata children in one statement,
/// so a read never observes a half-applied update.
const SELECT_ACCOUNT: &str = r#"
    SELECT u.id, u.username, u.email, u.password_hash, u.created_at, u.updated_at,
           COALESCE(
               (SELECT array_agg(r.role::text ORDER BY r.role) FROM user_roles r WHERE r.user_id = u.id),
               '{}'::text[]
           ) AS roles,
           COALESCE(
               (SELECT jsonb_object_agg(m.key, m.value) FROM user_metadata m WHERE m.user_id = u.id),
               '{}'::jsonb
           ) AS metadata
    FROM users u
"#;

pub struct PostgresAccountStore {
    pool: PgPool,
}

impl PostgresAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_by(&self, column: &str, key: &str) -> Result<Account, AuthError> {
        let sql = format!("{} WHERE u.{} = $1", SELECT_ACCOUNT, column);

        sqlx::query_as::<_, AccountRow>(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?
            .map(Account::from)
            .ok_or_else(|| AuthError::NotFound(key.to_string()))
    }

    /// Replace the role and metadata children of an account.
    async fn write_children(
        tx: &mut Transaction<'_, Postgres>,
        account_id: &AccountId,
        roles: impl Iterator<Item = &String>,
        metadata: &Metadata,
    ) -> Result<(), AuthError> {
        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(account_id.as_str())
            .execute(&mut **tx)
            .await?;

        for role in roles {
            sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, $2)")
                .bind(account_id.as_str())
                .bind(role)
                .execute(&mut **tx)
                .await?;
        }

        sqlx::query("DELETE FROM user_metadata WHERE user_id = $1")
            .bind(account_id.as_str())
            .execute(&mut **tx)
            .await?;

        for (key, value) in metadata {
            sqlx::query("INSERT INTO user_metadata (user_id, key, value) VALUES ($1, $2, $3)")
                .bind(account_id.as_str())
                .bind(key)
                .bind(Json(value))
                .execute(&mut **tx)
                .await?;
        }

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: String,
    username: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    roles: Vec<String>,
    metadata: Json<Metadata>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Self {
            id: AccountId::new(row.id),
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            roles: row.roles.into_iter().collect(),
            metadata: row.metadata.0,
            created_at: row.created_at.timestamp(),
            updated_at: row.updated_at.timestamp(),
        }
    }
}

/// Current time truncated to whole seconds, matching the in-memory backend.
fn now_seconds() -> Result<(i64, DateTime<Utc>), AuthError> {
    let seconds = Utc::now().timestamp();
    let instant = DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| AuthError::Database(format!("timestamp {} out of range", seconds)))?;
    Ok((seconds, instant))
}

fn map_write_error(err: sqlx::Error) -> AuthError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            let conflict = match db_err.constraint() {
                Some("users_username_key") => "username".to_string(),
                Some("users_email_key") => "email".to_string(),
                Some("users_pkey") => "account id".to_string(),
                Some(other) => other.to_string(),
                None => "unique key".to_string(),
            };
            return AuthError::AlreadyExists(conflict);
        }
    }
    AuthError::from(err)
}

#[async_trait]
impl AccountStore for PostgresAccountStore {
    async fn get_by_id(&self, id: &AccountId) -> Result<Account, AuthError> {
        self.fetch_one_by("id", id.as_str()).await
    }

    async fn get_by_username(&self, username: &str) -> Result<Account, AuthError> {
        self.fetch_one_by("username", username).await
    }

    async fn get_by_email(&self, email: &str) -> Result<Account, AuthError> {
        self.fetch_one_by("email", email).await
    }

    async fn create(&self, account: NewAccount) -> Result<Account, AuthError> {
        let id = account.id.clone().unwrap_or_else(AccountId::generate);
        let (seconds, now) = now_seconds()?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            "#,
        )
        .bind(id.as_str())
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        Self::write_children(&mut tx, &id, account.roles.iter(), &account.metadata).await?;

        tx.commit().await?;

        Ok(account.into_account(id, seconds))
    }

    async fn update(&self, mut account: Account) -> Result<Account, AuthError> {
        let (seconds, now) = now_seconds()?;

        let mut tx = self.pool.begin().await?;

        let created_at: Option<DateTime<Utc>> = sqlx::query_scalar(
            r#"
            UPDATE users
            SET username = $2, email = $3, password_hash = $4, updated_at = $5
            WHERE id = $1
            RETURNING created_at
            "#,
        )
        .bind(account.id.as_str())
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_write_error)?;

        let created_at = created_at.ok_or_else(|| AuthError::NotFound(account.id.to_string()))?;

        Self::write_children(&mut tx, &account.id, account.roles.iter(), &account.metadata).await?;

        tx.commit().await?;

        account.created_at = created_at.timestamp();
        account.updated_at = seconds;
        Ok(account)
    }

    async fn delete(&self, id: &AccountId) -> Result<(), AuthError> {
        // Roles and metadata go with the account through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound(id.to_string()));
        }

        Ok(())
    }
}

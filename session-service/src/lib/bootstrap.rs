use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::config::DatabaseConfig;
use crate::config::SeedAccountConfig;
use crate::domain::account::ports::AccountStore;
use crate::domain::errors::AuthError;
use crate::domain::provider::deadline::with_deadline;
use crate::domain::provider::local::LocalProvider;
use crate::domain::provider::registry::ProviderRegistry;
use crate::domain::provider::revoking::RevokingProvider;
use crate::domain::revocation::ports::RevocationStore;
use crate::domain::revocation::sweeper::spawn_revocation_sweeper;
use crate::outbound::memory::MemoryAccountStore;
use crate::outbound::memory::MemoryRevocationStore;
use crate::outbound::repositories::PostgresAccountStore;
use crate::outbound::repositories::PostgresRevocationStore;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Storage the registry ended up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Postgres,
    Memory,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Postgres => f.write_str("postgresql"),
            Backend::Memory => f.write_str("memory"),
        }
    }
}

/// Everything a host process needs to serve authentication.
pub struct Services {
    pub registry: ProviderRegistry,
    pub backend: Backend,
    /// Background revocation sweep; aborted by [`Services::shutdown`]
    pub sweeper: JoinHandle<()>,
}

impl Services {
    pub fn shutdown(self) {
        self.sweeper.abort();
    }
}

/// Build the provider registry described by `config`.
///
/// Uses PostgreSQL (after applying migrations) when a database URL is
/// configured and reachable, the in-memory backends otherwise. The
/// revocation-aware local provider is registered under `"local"`, the seed
/// account is created when configured and absent, and the revocation
/// sweeper is started.
///
/// Must be called from within a tokio runtime.
///
/// # Errors
/// * `Configuration` - Token lifetime is unusable
/// * `Password` - Seed password violates the policy
/// * `Database` - Seeding failed on the chosen backend
pub async fn build_registry(config: &Config) -> Result<Services, AuthError> {
    let authenticator = Arc::new(
        Authenticator::new(config.token.secret.as_bytes(), config.token.lifetime())?
            .with_password_policy(config.password.policy()),
    );

    if let Some(url) = &config.database.url {
        match connect(&config.database, url).await {
            Ok(pool) => {
                tracing::info!(
                    max_connections = config.database.max_connections,
                    database = "postgresql",
                    "Database connection pool created"
                );
                return install(
                    Arc::new(PostgresAccountStore::new(pool.clone())),
                    Arc::new(PostgresRevocationStore::new(pool)),
                    authenticator,
                    config,
                    Backend::Postgres,
                )
                .await;
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "PostgreSQL unavailable, falling back to in-memory storage"
                );
            }
        }
    }

    install(
        Arc::new(MemoryAccountStore::new()),
        Arc::new(MemoryRevocationStore::new()),
        authenticator,
        config,
        Backend::Memory,
    )
    .await
}

async fn connect(database: &DatabaseConfig, url: &str) -> Result<PgPool, AuthError> {
    let pool = PgPoolOptions::new()
        .max_connections(database.max_connections)
        .acquire_timeout(CONNECT_TIMEOUT)
        .connect(url)
        .await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| AuthError::Database(e.to_string()))?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    Ok(pool)
}

async fn install<S, R>(
    store: Arc<S>,
    revocations: Arc<R>,
    authenticator: Arc<Authenticator>,
    config: &Config,
    backend: Backend,
) -> Result<Services, AuthError>
where
    S: AccountStore,
    R: RevocationStore,
{
    let local =
        LocalProvider::new(store, authenticator).with_deadline(config.operations.deadline());

    if let Some(seed) = &config.seed {
        seed_account(&local, seed).await?;
    }

    let sweeper = spawn_revocation_sweeper(Arc::clone(&revocations), config.sweeper.interval());

    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(RevokingProvider::new(local, revocations)));

    tracing::info!(
        backend = %backend,
        providers = ?registry.names(),
        "Provider registry ready"
    );

    Ok(Services {
        registry,
        backend,
        sweeper,
    })
}

async fn seed_account<S>(
    provider: &LocalProvider<S>,
    seed: &SeedAccountConfig,
) -> Result<(), AuthError>
where
    S: AccountStore,
{
    match with_deadline(
        provider.deadline(),
        provider.store().get_by_username(&seed.username),
    )
    .await
    {
        Ok(_) => {
            tracing::debug!(username = %seed.username, "Seed account already present");
            return Ok(());
        }
        Err(AuthError::NotFound(_)) => {}
        Err(e) => return Err(e),
    }

    match provider
        .register(&seed.username, &seed.email, &seed.password, seed.roles.iter().cloned())
        .await
    {
        Ok(_) => Ok(()),
        // Another instance seeded it first.
        Err(AuthError::AlreadyExists(_)) => Ok(()),
        Err(e) => Err(e),
    }
}

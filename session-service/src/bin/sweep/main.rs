use std::time::Duration;

use anyhow::Context;
use session_service::config::Config;
use session_service::repositories::PostgresRevocationStore;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const SWEEP_TIMEOUT: Duration = Duration::from_secs(30);

/// One-shot removal of expired revocation records, for cron-style
/// deployments that do not run the in-process sweeper.
#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "session_service=debug,sweep_revoked_tokens=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "sweep-revoked-tokens",
        version = env!("CARGO_PKG_VERSION"),
        "Sweep starting"
    );

    let config = Config::load()?;
    let url = config
        .database
        .url
        .as_deref()
        .context("database.url must be set to sweep revocations")?;

    let pg_pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(SWEEP_TIMEOUT)
        .connect(url)
        .await?;
    tracing::info!(database = "postgresql", "Database connection established");

    let store = PostgresRevocationStore::new(pg_pool);
    let removed = tokio::time::timeout(SWEEP_TIMEOUT, store.sweep_expired_at(chrono::Utc::now()))
        .await
        .context("revocation sweep timed out")??;

    tracing::info!(removed, "Expired revocations swept");

    Ok(())
}

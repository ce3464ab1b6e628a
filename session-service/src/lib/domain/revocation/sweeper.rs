use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::domain::revocation::ports::RevocationStore;

/// Sweep expired revocation records every `every` until the returned handle
/// is aborted.
///
/// The first sweep happens one full interval after spawning. A failed sweep
/// is logged and retried on the next tick.
///
/// # Panics
/// If `every` is zero.
pub fn spawn_revocation_sweeper<R>(store: Arc<R>, every: Duration) -> JoinHandle<()>
where
    R: RevocationStore + ?Sized,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            ticker.tick().await;

            match store.sweep_expired().await {
                Ok(0) => tracing::debug!("Revocation sweep found nothing to remove"),
                Ok(removed) => tracing::info!(removed, "Expired revocations swept"),
                Err(e) => tracing::error!(error = %e, "Revocation sweep failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;
    use chrono::Utc;

    use super::*;
    use crate::outbound::memory::MemoryRevocationStore;

    #[tokio::test(start_paused = true)]
    async fn test_sweeps_on_interval() {
        let store = Arc::new(MemoryRevocationStore::new());
        let now = Utc::now();
        store
            .revoke_at("stale", now - ChronoDuration::seconds(1), now - ChronoDuration::hours(1))
            .await;
        store
            .revoke_at("live", now + ChronoDuration::hours(1), now)
            .await;

        let handle = spawn_revocation_sweeper(Arc::clone(&store), Duration::from_secs(60));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(store.len().await, 2);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(store.len().await, 1);

        handle.abort();
    }
}

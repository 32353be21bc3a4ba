//! Expired Token Sweeper
//!
//! Tokens are never deleted on consume, so expired entries are purged on a
//! fixed schedule for as long as the server runs.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::application::bounded;
use crate::application::config::PromoConfig;
use crate::domain::repository::TokenStore;

/// Spawn a background task purging expired tokens every
/// `token_cleanup_interval`. The first sweep runs immediately.
pub fn spawn_token_sweeper<T>(store: Arc<T>, config: &PromoConfig) -> JoinHandle<()>
where
    T: TokenStore + Send + Sync + 'static,
{
    let period = config.token_cleanup_interval;
    let timeout = config.store_timeout;

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            sweep(store.as_ref(), timeout).await;
        }
    })
}

async fn sweep<T: TokenStore>(store: &T, timeout: Duration) {
    match bounded(timeout, store.cleanup_expired()).await {
        Ok(0) => {}
        Ok(removed) => {
            tracing::info!(tokens = removed, "Swept expired validation tokens");
        }
        Err(e) => {
            // Next tick retries
            tracing::warn!(error = %e, "Validation token sweep failed");
        }
    }
}

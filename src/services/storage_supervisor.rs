//! Keeps the store slot populated, reconnecting with backoff when the
//! backend drops and toggling degraded mode for the rest of the app.

use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{panel_store::PanelStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Connect to the storage backend and keep the shared state in degraded
/// mode whenever it is unavailable.
///
/// The `connect` closure is retried forever with exponential backoff; once
/// a store is installed, its health is polled and a bounded number of
/// reconnect attempts are made before the connection is torn down and the
/// outer connect loop starts over.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn PanelStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match connect().await {
            Ok(store) => {
                state.install_panel_store(store.clone()).await;
                info!("storage connection established; leaving degraded mode");
                delay = INITIAL_DELAY;

                monitor(&state, store.as_ref()).await;

                state.clear_panel_store().await;
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
            Err(StorageError::Unconfigured(message)) => {
                // Nothing to retry against; stay degraded until restarted
                // with a configured backend.
                warn!(%message, "storage backend not configured; staying in degraded mode");
                return;
            }
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}

/// Poll the installed store until its connection is lost for good.
async fn monitor(state: &SharedState, store: &dyn PanelStore) {
    loop {
        match store.health_check().await {
            Ok(()) => {
                if state.update_degraded(false) {
                    info!("storage healthy again; leaving degraded mode");
                }
                sleep(HEALTH_POLL_INTERVAL).await;
            }
            Err(err) => {
                warn!(error = %err, "storage health check failed; attempting reconnect");
                if reconnect_with_backoff(state, store).await {
                    state.update_degraded(false);
                    sleep(HEALTH_POLL_INTERVAL).await;
                } else {
                    warn!("exhausted storage reconnect attempts; dropping the connection");
                    return;
                }
            }
        }
    }
}

/// Bounded reconnect attempts with exponential backoff; returns whether
/// the connection was recovered.
async fn reconnect_with_backoff(state: &SharedState, store: &dyn PanelStore) -> bool {
    let mut delay = INITIAL_DELAY;

    for attempt in 0..MAX_RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => {
                info!(attempt, "storage reconnection succeeded");
                return true;
            }
            Err(err) => {
                if attempt == 0 {
                    warn!(attempt, error = %err, "storage reconnect failed; entering degraded mode");
                    state.update_degraded(true);
                } else {
                    warn!(attempt, error = %err, "storage reconnect attempt failed");
                }
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }

    false
}

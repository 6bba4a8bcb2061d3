//! Shared application state: the store slot, change hub, and flow sessions.

pub mod changes;
pub mod flow;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, watch};
use uuid::Uuid;

pub use self::changes::{ChangeEvent, ChangeHub, TableKind};
pub use self::flow::{FlowError, FlowEvent, FlowStep, PriorAttempt, ViewerFlow};

use crate::{config::AppConfig, dao::panel_store::PanelStore, error::ServiceError};

/// Cheaply clonable handle to the application state.
pub type SharedState = Arc<AppState>;

/// Key identifying one viewer's flow within one game.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FlowKey {
    /// Game being played.
    pub game_id: Uuid,
    /// Host identity of the viewer.
    pub host_id: String,
}

/// Central application state shared by every request handler.
pub struct AppState {
    store: RwLock<Option<Arc<dyn PanelStore>>>,
    changes: ChangeHub,
    flows: DashMap<FlowKey, Arc<Mutex<ViewerFlow>>>,
    degraded: watch::Sender<bool>,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            store: RwLock::new(None),
            changes: ChangeHub::new(config.change_hub_capacity),
            flows: DashMap::new(),
            degraded: degraded_tx,
            config,
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current store, if one is installed.
    pub async fn panel_store(&self) -> Option<Arc<dyn PanelStore>> {
        let guard = self.store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the store or fail with the degraded-mode error.
    pub async fn require_panel_store(&self) -> Result<Arc<dyn PanelStore>, ServiceError> {
        self.panel_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a storage backend and leave degraded mode.
    pub async fn install_panel_store(&self, store: Arc<dyn PanelStore>) {
        {
            let mut guard = self.store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current storage backend and enter degraded mode.
    pub async fn clear_panel_store(&self) {
        {
            let mut guard = self.store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag, returning whether it changed.
    ///
    /// The watch value is the source of truth here; the store slot can hold
    /// a handle whose connection is currently unhealthy.
    pub fn update_degraded(&self, value: bool) -> bool {
        self.degraded.send_if_modified(|current| {
            if *current != value {
                *current = value;
                true
            } else {
                false
            }
        })
    }

    /// Hub distributing table change notifications.
    pub fn changes(&self) -> &ChangeHub {
        &self.changes
    }

    /// Existing flow session for a (game, viewer) pair, if one is live.
    pub fn existing_flow(&self, key: &FlowKey) -> Option<Arc<Mutex<ViewerFlow>>> {
        self.flows.get(key).map(|entry| entry.value().clone())
    }

    /// Store a freshly opened flow session, returning its shared handle.
    ///
    /// Sessions the same viewer holds on other games are evicted: the
    /// channel's active game changed, so their transient state is stale.
    pub fn store_flow(&self, key: FlowKey, flow: ViewerFlow) -> Arc<Mutex<ViewerFlow>> {
        self.flows
            .retain(|existing, _| existing.host_id != key.host_id || existing.game_id == key.game_id);
        let handle = Arc::new(Mutex::new(flow));
        self.flows.insert(key, handle.clone());
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{config::AppConfig, dao::panel_store::memory::MemoryPanelStore};

    #[tokio::test]
    async fn degraded_watch_clears_after_health_incident_recovers() {
        let state = AppState::new(AppConfig::default());
        let watcher = state.degraded_watcher();
        assert!(*watcher.borrow());

        state
            .install_panel_store(Arc::new(MemoryPanelStore::new()))
            .await;
        assert!(!*watcher.borrow());

        // A failed health check flags degraded while the store handle is
        // still installed.
        assert!(state.update_degraded(true));
        assert!(state.is_degraded());
        assert!(*watcher.borrow());

        // Reconnecting must broadcast healthy again even though the store
        // slot never changed.
        assert!(state.update_degraded(false));
        assert!(!state.is_degraded());
        assert!(!*watcher.borrow());

        // Repeating the same value is a no-op.
        assert!(!state.update_degraded(false));
    }
}

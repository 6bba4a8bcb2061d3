//! Quiz panel backend entrypoint wiring REST routes, SSE, and the store supervisor.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod context;
mod dao;
mod dto;
mod error;
mod routes;
mod services;
mod state;

use config::AppConfig;
use dao::{panel_store::PanelStore, storage::StorageError};
use services::storage_supervisor;
use state::{AppState, SharedState};

/// Environment variable selecting the storage backend (`rest` or `memory`).
const STORE_BACKEND_ENV: &str = "QUIZ_PANEL_STORE";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let app_state = AppState::new(AppConfig::load());

    spawn_storage_supervisor(app_state.clone());
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Spawn the storage supervisor against the backend selected by environment.
///
/// Without a selected backend the supervisor fails fast with a distinct
/// configuration error and the app stays in degraded mode, instead of
/// pretending to have a store that silently returns nothing.
fn spawn_storage_supervisor(state: SharedState) {
    let backend = env::var(STORE_BACKEND_ENV).unwrap_or_default();

    match backend.as_str() {
        #[cfg(feature = "rest-store")]
        "rest" => {
            tokio::spawn(storage_supervisor::run(state, || async {
                let config = dao::panel_store::rest::RestConfig::from_env()?;
                let store = dao::panel_store::rest::RestPanelStore::connect(config).await?;
                Ok(Arc::new(store) as Arc<dyn PanelStore>)
            }));
        }
        #[cfg(feature = "memory-store")]
        "memory" => {
            warn!("using the in-memory store; data is lost on restart");
            tokio::spawn(storage_supervisor::run(state, || async {
                let store = dao::panel_store::memory::MemoryPanelStore::new();
                Ok(Arc::new(store) as Arc<dyn PanelStore>)
            }));
        }
        other => {
            let message = if other.is_empty() {
                format!("{STORE_BACKEND_ENV} is not set")
            } else {
                format!("unknown storage backend `{other}`")
            };
            tokio::spawn(storage_supervisor::run(state, move || {
                let message = message.clone();
                async move {
                    Err::<Arc<dyn PanelStore>, _>(StorageError::Unconfigured(message))
                }
            }));
        }
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: state::SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

use std::{sync::Arc, time::Duration};

use axum::Router;
use configs::{AppConfig, StoreBackend, StoreConfig};
use tower_http::cors::CorsLayer;
use tracing::info;

use service::licenses::LicenseService;
use service::storage::{JsonFileKvStore, KvStore, MemoryKvStore, RestKvStore};

use crate::errors::StartupError;
use crate::routes;
use crate::state::ServerState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Instantiate the configured key-value backend.
pub async fn build_store(cfg: &StoreConfig) -> Result<Arc<dyn KvStore>, StartupError> {
    let store: Arc<dyn KvStore> = match cfg.backend {
        StoreBackend::Memory => Arc::new(MemoryKvStore::new()),
        StoreBackend::File => {
            common::env::ensure_data_parent(&cfg.file_path).await?;
            Arc::new(JsonFileKvStore::new(&cfg.file_path).await?)
        }
        StoreBackend::Rest => Arc::new(RestKvStore::new(
            &cfg.rest_url,
            cfg.rest_token.clone(),
            Duration::from_secs(cfg.timeout_secs),
        )?),
    };
    info!(backend = ?cfg.backend, key = %cfg.key, "kv store ready");
    Ok(store)
}

pub async fn build_state(cfg: &AppConfig) -> Result<ServerState, StartupError> {
    let store = build_store(&cfg.store).await?;
    let licenses = LicenseService::new(store, cfg.store.key.clone(), cfg.admin.password.clone());
    Ok(ServerState::new(licenses))
}

pub async fn build_app(cfg: &AppConfig) -> Result<Router, StartupError> {
    common::env::ensure_frontend(&cfg.server.frontend_dir).await;
    let state = build_state(cfg).await?;
    Ok(routes::build_router(state, &cfg.server.frontend_dir, build_cors()))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!(event = "shutdown_signal", "received Ctrl+C, shutting down");
    }
}

/// Serve the app built from `cfg` until Ctrl+C.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let app = build_app(&cfg).await?;
    let addr = cfg.server.bind_addr()?;
    info!(%addr, "starting license panel");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

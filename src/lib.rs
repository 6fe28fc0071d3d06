pub mod api;
pub mod config;
pub mod error;
pub mod logic;
pub mod model;
pub mod store;

pub use api::routes;
pub use error::{ApiError, ApiResult};
pub use logic::{MetricsSource, Registry, UnavailableMetrics};
pub use model::*;
pub use store::{MemoryStore, PostgresStore, Store};

use axum::Router;
use std::sync::Arc;
use std::time::Duration;

use crate::api::{AppState, Authenticator};
use crate::config::{AppConfig, StorageBackend};

/// Router over `store`, wired with the configured API version, replica
/// limit, credential table and aggregate timeout.
pub fn build_app<S: Store + 'static>(
    store: Arc<S>,
    config: &AppConfig,
    metrics: Arc<dyn MetricsSource>,
) -> Router {
    let registry = Registry::new(store, &config.api.version, metrics)
        .with_max_replicas(config.api.max_replicas);
    let auth = Authenticator::new(config.auth.tokens.clone());
    routes::create_router::<S>(Duration::from_millis(config.api.aggregate_timeout_ms))
        .with_state(AppState::new(registry, auth))
}

/// Open the configured backend and serve until the listener fails.
pub async fn run_server(config: &AppConfig) -> anyhow::Result<()> {
    match config.storage.backend {
        StorageBackend::Memory => {
            log::info!("Using in-memory storage");
            serve(Arc::new(MemoryStore::new()), config).await
        }
        StorageBackend::Postgres => {
            log::info!("Connecting to PostgreSQL...");
            let database_url = config.database_url()?;
            let store = PostgresStore::new(&database_url, config.max_connections()).await?;
            store.migrate().await?;
            serve(Arc::new(store), config).await
        }
    }
}

async fn serve<S: Store + 'static>(store: Arc<S>, config: &AppConfig) -> anyhow::Result<()> {
    use tokio::net::TcpListener;

    let app = build_app(store, config, Arc::new(UnavailableMetrics));
    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;
    log::info!("API server listening on http://{}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}

//! Zoo API server: animal registry and time-series query proxy.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zoo_api::config::ServiceConfig;
use zoo_api::server::{self, AppState};
use zoo_query::QueryProxy;
use zoo_registry::InMemoryEntityRegistry;
use zoo_store::SqliteTimeSeriesStore;
use zoo_types::{EntityRegistry, TimeSeriesStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServiceConfig::from_env()?;

    let store: Arc<dyn TimeSeriesStore> = Arc::new(
        SqliteTimeSeriesStore::new(config.database.clone())?.with_busy_timeout(config.query_timeout),
    );
    let proxy = QueryProxy::new(store, config.query_endpoint.clone())
        .with_query_timeout(config.query_timeout);
    let registry: Arc<dyn EntityRegistry + Send + Sync> = Arc::new(InMemoryEntityRegistry::new());
    let state = Arc::new(AppState {
        registry,
        proxy: Arc::new(proxy),
    });

    let app = server::router(state);
    tracing::info!(
        listen = %config.listen,
        endpoint = %config.query_endpoint,
        "zoo API listening"
    );
    axum::serve(
        tokio::net::TcpListener::bind(config.listen).await?,
        app.into_make_service(),
    )
    .await?;
    Ok(())
}

use std::sync::Arc;

use anyhow::Context;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use municipal_link::api::{app, AppState};
use municipal_link::config;
use municipal_link::database::{DatabaseManager, MemoryStore, PgStore};

const FALLBACK_POOL_NAME: &str = "Unassigned citizens";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, LINK_FALLBACK_TENANT_ID, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::config();
    info!("Starting Municipal Link in {:?} mode", config.environment);

    let (state, database) = match std::env::var("LINK_STORAGE").as_deref() {
        Ok("memory") => {
            warn!("Using in-memory storage; data is lost on shutdown");
            let store = Arc::new(MemoryStore::new());
            (AppState::from_store(store, config.linking.clone()), None)
        }
        _ => {
            let database = DatabaseManager::connect(&config.database)
                .await
                .context("failed to connect to database")?;
            let store = Arc::new(PgStore::new(&database));
            store.migrate().await.context("failed to apply migrations")?;
            (AppState::from_store(store, config.linking.clone()), Some(database))
        }
    };

    state
        .tenants
        .ensure_fallback_pool(FALLBACK_POOL_NAME)
        .await
        .context("failed to provision fallback pool tenant")?;
    info!("Fallback pool tenant: {}", config.linking.fallback_tenant_id);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Municipal Link listening on http://{}", bind_addr);

    let router = if config.api.enable_request_logging {
        app(state).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
    } else {
        app(state)
    };

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(database) = database {
        database.close().await;
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::config::LinkingConfig;
use crate::database::models::FallbackPool;
use crate::database::store::{CitizenStore, TenantDirectory, TenantRegistry};
use crate::handlers;
use crate::linking::{LinkingOrchestrator, TenantLifecycleHook};
use crate::services::{CitizenRegistration, TenantService};

/// Shared handler state; every component receives its storage explicitly
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<dyn TenantDirectory>,
    pub orchestrator: Arc<LinkingOrchestrator>,
    pub tenants: Arc<TenantService>,
    pub registration: Arc<CitizenRegistration>,
}

impl AppState {
    /// Wire all components on top of one store implementing every storage trait
    pub fn from_store<S>(store: Arc<S>, config: LinkingConfig) -> Self
    where
        S: TenantRegistry + CitizenStore + 'static,
    {
        let pool = FallbackPool::new(config.fallback_tenant_id);
        let orchestrator = Arc::new(LinkingOrchestrator::new(store.clone(), store.clone(), config));
        let hook = TenantLifecycleHook::new(orchestrator.clone());

        Self {
            directory: store.clone(),
            tenants: Arc::new(TenantService::new(store.clone(), hook, pool)),
            registration: Arc::new(CitizenRegistration::new(store.clone(), store, pool)),
            orchestrator,
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(handlers::health::health))
        .route("/api/citizen/register", post(handlers::citizen::citizen_register))
        // Administrative
        .merge(root_routes())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn root_routes() -> Router<AppState> {
    use handlers::root;

    Router::new()
        .route("/api/root/linking", post(root::linking_run))
        .route("/api/root/tenant", get(root::tenant_list).post(root::tenant_create))
        .route("/api/root/tenant/:id", get(root::tenant_show))
        .route("/api/root/tenant/:id/status", patch(root::tenant_status))
        .route("/api/root/tenant/:id/location", patch(root::tenant_location))
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Municipal Link",
            "version": version,
            "description": "Citizen-to-municipality tenant resolution and auto-linking",
            "endpoints": {
                "health": "/health (public)",
                "register": "/api/citizen/register (public)",
                "linking": "/api/root/linking (restricted)",
                "tenant": "/api/root/tenant[/:id[/status|/location]] (restricted)",
            }
        }
    }))
}

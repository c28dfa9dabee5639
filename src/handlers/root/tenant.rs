// handlers/root/tenant.rs - Tenant lifecycle handlers

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::api::AppState;
use crate::database::models::{NewTenant, Tenant};
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::{TenantId, TenantStatus};

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: TenantStatus,
}

#[derive(Debug, Deserialize)]
pub struct LocationRequest {
    #[serde(default)]
    pub municipality: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

/// GET /api/root/tenant
pub async fn tenant_list(State(state): State<AppState>) -> ApiResult<Vec<Tenant>> {
    Ok(ApiResponse::success(state.tenants.list().await?))
}

/// GET /api/root/tenant/:id
pub async fn tenant_show(State(state): State<AppState>, Path(id): Path<TenantId>) -> ApiResult<Tenant> {
    Ok(ApiResponse::success(state.tenants.get(id).await?))
}

/// POST /api/root/tenant - provision; eligible tenants claim waiting citizens
pub async fn tenant_create(State(state): State<AppState>, Json(input): Json<NewTenant>) -> ApiResult<Tenant> {
    Ok(ApiResponse::created(state.tenants.provision(input).await?))
}

/// PATCH /api/root/tenant/:id/status
pub async fn tenant_status(
    State(state): State<AppState>,
    Path(id): Path<TenantId>,
    Json(req): Json<StatusRequest>,
) -> ApiResult<Tenant> {
    Ok(ApiResponse::success(state.tenants.update_status(id, req.status).await?))
}

/// PATCH /api/root/tenant/:id/location
pub async fn tenant_location(
    State(state): State<AppState>,
    Path(id): Path<TenantId>,
    Json(req): Json<LocationRequest>,
) -> ApiResult<Tenant> {
    let tenant = state
        .tenants
        .update_location(id, req.municipality, req.state)
        .await?;
    Ok(ApiResponse::success(tenant))
}

// handlers/root/linking.rs - POST /api/root/linking handler

use axum::{body::Bytes, extract::State};
use serde::Deserialize;

use crate::api::AppState;
use crate::error::ApiError;
use crate::linking::LinkOutcome;
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::TenantId;

#[derive(Debug, Default, Deserialize)]
pub struct LinkRequest {
    /// Restrict the run to one tenant; omitted for a global run
    #[serde(default)]
    pub tenant_id: Option<TenantId>,
}

/// POST /api/root/linking - run auto-linking and return the full outcome
///
/// The body is optional; an empty body runs globally. A body that is present
/// but not a valid request is rejected rather than widened to a global run.
pub async fn linking_run(State(state): State<AppState>, body: Bytes) -> ApiResult<LinkOutcome> {
    let target = parse_request(&body)?.tenant_id;
    let outcome = state.orchestrator.run_linking(target).await?;
    Ok(ApiResponse::success(outcome))
}

fn parse_request(body: &[u8]) -> Result<LinkRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(LinkRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::bad_request(format!("Invalid linking request: {}", e)))
}

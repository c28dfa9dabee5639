// handlers/citizen.rs - POST /api/citizen/register handler

use axum::{extract::State, Json};

use crate::api::AppState;
use crate::database::models::{Citizen, NewCitizen};
use crate::middleware::{ApiResponse, ApiResult};

/// Register a citizen, placing them in their municipality tenant when one is
/// eligible and in the fallback pool otherwise.
pub async fn citizen_register(State(state): State<AppState>, Json(input): Json<NewCitizen>) -> ApiResult<Citizen> {
    Ok(ApiResponse::created(state.registration.register(input).await?))
}

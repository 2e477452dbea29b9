use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::responses::UsageResponse;
use crate::error::AppError;

pub async fn get_usage(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let quota = state.quota();
    let responses = quota.check_response_quota(&actor.tenant_id).await?;
    let locations = quota.check_location_quota(&actor.tenant_id).await?;
    Ok(Json(UsageResponse { responses, locations }))
}

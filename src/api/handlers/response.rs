use axum::{extract::{State, Path}, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::info;
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::{EditResponseRequest, RejectResponseRequest};
use crate::api::handlers::business::owned_business;
use crate::domain::models::{brand::BrandSettings, review::Review, business::Business};
use crate::error::AppError;

// A review is visible only through a business of the caller's tenant.
async fn owned_review(state: &AppState, tenant_id: &str, review_id: &str) -> Result<(Review, Business), AppError> {
    let review = state.review_repo.find_by_id(review_id).await?
        .ok_or_else(|| AppError::NotFound(format!("Review {} not found", review_id)))?;
    let business = owned_business(state, tenant_id, &review.business_id).await
        .map_err(|_| AppError::NotFound(format!("Review {} not found", review_id)))?;
    Ok((review, business))
}

pub async fn generate_response(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(review_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (review, business) = owned_review(&state, &actor.tenant_id, &review_id).await?;

    let quota = state.quota().check_response_quota(&actor.tenant_id).await?;
    if !quota.allowed {
        return Err(AppError::QuotaExceeded(quota.reason.unwrap_or_else(|| "Response limit reached".into())));
    }

    let settings = state.brand_settings_repo.find_by_business(&business.id).await?
        .unwrap_or_else(|| BrandSettings::defaults_for(&business.id));

    let response = state.response_generator().generate(&review, &business, &settings).await?;
    info!("Generated response {} for review {}", response.id, review.id);
    Ok(Json(response))
}

pub async fn list_responses(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(review_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (review, _) = owned_review(&state, &actor.tenant_id, &review_id).await?;
    let responses = state.response_repo.list_by_review(&review.id).await?;
    Ok(Json(responses))
}

pub async fn get_response(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(response_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.response_lifecycle().get(&actor.tenant_id, &response_id).await?;
    Ok(Json(response))
}

pub async fn edit_response(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(response_id): Path<String>,
    Json(payload): Json<EditResponseRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.response_lifecycle()
        .edit_content(&actor.tenant_id, &response_id, payload.content, payload.expected_version)
        .await?;
    Ok(Json(response))
}

pub async fn approve_response(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(response_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.response_lifecycle()
        .approve(&actor.tenant_id, &response_id, &actor.user_id)
        .await?;
    Ok(Json(response))
}

pub async fn publish_response(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(response_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.response_lifecycle().publish(&actor.tenant_id, &response_id).await?;
    Ok(Json(response))
}

pub async fn reject_response(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(response_id): Path<String>,
    Json(payload): Json<RejectResponseRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.response_lifecycle()
        .reject(&actor.tenant_id, &response_id, payload.reason)
        .await?;
    Ok(Json(response))
}

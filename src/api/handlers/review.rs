use axum::{extract::{State, Path, Query}, response::IntoResponse, Json};
use std::sync::Arc;
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::ListReviewsQuery;
use crate::api::handlers::business::owned_business;
use crate::error::AppError;

const DEFAULT_PAGE: i64 = 50;
const MAX_PAGE: i64 = 200;

pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(business_id): Path<String>,
    Query(query): Query<ListReviewsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let business = owned_business(&state, &actor.tenant_id, &business_id).await?;
    let limit = query.limit.unwrap_or(DEFAULT_PAGE).clamp(1, MAX_PAGE);
    let reviews = state.review_repo.list_by_business(&business.id, limit).await?;
    Ok(Json(reviews))
}

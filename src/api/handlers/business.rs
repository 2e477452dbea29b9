use axum::{extract::{State, Path}, response::IntoResponse, Json};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::{
    requests::{CreateBusinessRequest, UpdateConnectionRequest},
    responses::SyncBusinessResponse,
};
use crate::domain::models::business::Business;
use crate::error::AppError;

pub(crate) async fn owned_business(state: &AppState, tenant_id: &str, business_id: &str) -> Result<Business, AppError> {
    state.business_repo.find_by_id(tenant_id, business_id).await?
        .ok_or_else(|| AppError::NotFound(format!("Business {} not found", business_id)))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub async fn list_businesses(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let businesses = state.business_repo.list_by_tenant(&actor.tenant_id).await?;
    Ok(Json(businesses))
}

pub async fn create_business(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Json(payload): Json<CreateBusinessRequest>,
) -> Result<impl IntoResponse, AppError> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("Business name is required".into()));
    }

    let quota = state.quota().check_location_quota(&actor.tenant_id).await?;
    if !quota.allowed {
        return Err(AppError::QuotaExceeded(quota.reason.unwrap_or_else(|| "Location limit reached".into())));
    }

    let mut business = Business::new(actor.tenant_id.clone(), name);
    business.gmb_account_id = non_blank(payload.gmb_account_id);
    business.gmb_location_id = non_blank(payload.gmb_location_id);
    business.gmb_location_name = non_blank(payload.gmb_location_name);

    let created = state.business_repo.create(&business).await?;
    info!("Created business {} for tenant {}", created.id, created.tenant_id);
    Ok(Json(created))
}

pub async fn update_connection(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(business_id): Path<String>,
    Json(payload): Json<UpdateConnectionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut business = owned_business(&state, &actor.tenant_id, &business_id).await?;

    let account = non_blank(Some(payload.gmb_account_id))
        .ok_or_else(|| AppError::Validation("gmb_account_id is required".into()))?;
    let location = non_blank(Some(payload.gmb_location_id))
        .ok_or_else(|| AppError::Validation("gmb_location_id is required".into()))?;

    business.gmb_account_id = Some(account);
    business.gmb_location_id = Some(location);
    business.gmb_location_name = non_blank(payload.gmb_location_name);
    business.updated_at = Utc::now();

    let updated = state.business_repo.update_connection(&business).await?;
    info!("Business {} connected to {:?}", updated.id, updated.location_ref());
    Ok(Json(updated))
}

pub async fn deactivate_business(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(business_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    owned_business(&state, &actor.tenant_id, &business_id).await?;
    state.business_repo.deactivate(&actor.tenant_id, &business_id).await?;
    info!("Deactivated business {}", business_id);
    Ok(Json(serde_json::json!({"status": "deactivated"})))
}

pub async fn sync_business(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(business_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let business = owned_business(&state, &actor.tenant_id, &business_id).await?;
    let outcome = state.review_sync().sync_business(&business).await?;
    Ok(Json(SyncBusinessResponse {
        business_id: business.id,
        reviews_count: outcome.reviews_count,
        new_reviews: outcome.new_reviews,
    }))
}

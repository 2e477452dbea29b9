use axum::{extract::{State, Path}, response::IntoResponse, Json};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::UpdateBrandSettingsRequest;
use crate::api::handlers::business::owned_business;
use crate::domain::models::brand::{BrandSettings, ResponseLength, Tone};
use crate::error::AppError;

pub async fn get_brand_settings(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(business_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let business = owned_business(&state, &actor.tenant_id, &business_id).await?;
    let settings = state.brand_settings_repo.find_by_business(&business.id).await?
        .unwrap_or_else(|| BrandSettings::defaults_for(&business.id));
    Ok(Json(settings))
}

pub async fn update_brand_settings(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(business_id): Path<String>,
    Json(payload): Json<UpdateBrandSettingsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let business = owned_business(&state, &actor.tenant_id, &business_id).await?;
    let mut settings = state.brand_settings_repo.find_by_business(&business.id).await?
        .unwrap_or_else(|| BrandSettings::defaults_for(&business.id));

    // Labels are normalized on write so reads never carry unknown values.
    if let Some(tone) = payload.tone {
        settings.tone = Tone::from_label(&tone).as_str().to_string();
    }
    if let Some(length) = payload.response_length {
        settings.response_length = ResponseLength::from_label(&length).as_str().to_string();
    }
    if let Some(greeting) = payload.greeting {
        settings.greeting = Some(greeting).filter(|g| !g.trim().is_empty());
    }
    if let Some(closing) = payload.closing {
        settings.closing = Some(closing).filter(|c| !c.trim().is_empty());
    }
    if let Some(code) = payload.coupon_code {
        settings.coupon_code = Some(code).filter(|c| !c.trim().is_empty());
    }
    if let Some(v) = payload.include_coupon { settings.include_coupon = v; }
    if let Some(v) = payload.auto_publish { settings.auto_publish = v; }
    if let Some(v) = payload.notify_on_negative { settings.notify_on_negative = v; }

    if settings.include_coupon && settings.coupon_code.is_none() {
        return Err(AppError::Validation("coupon_code is required when include_coupon is set".into()));
    }
    settings.updated_at = Utc::now();

    let saved = state.brand_settings_repo.upsert(&settings).await?;
    info!("Brand settings updated for business {}", saved.business_id);
    Ok(Json(saved))
}

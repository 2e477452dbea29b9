use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::UpdateNotificationPreferencesRequest;
use crate::domain::models::notification::{DigestFrequency, NotificationPreferences};
use crate::error::AppError;

const DEFAULT_DIGEST_DAY: i32 = 1; // Monday

pub async fn get_preferences(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let prefs = state.notification_prefs_repo.find_by_tenant(&actor.tenant_id).await?
        .unwrap_or_else(|| NotificationPreferences::defaults_for(&actor.tenant_id));
    Ok(Json(prefs))
}

pub async fn update_preferences(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Json(payload): Json<UpdateNotificationPreferencesRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut prefs = state.notification_prefs_repo.find_by_tenant(&actor.tenant_id).await?
        .unwrap_or_else(|| NotificationPreferences::defaults_for(&actor.tenant_id));

    if let Some(email) = payload.email {
        let email = email.trim().to_string();
        if !email.is_empty() && !email.contains('@') {
            return Err(AppError::Validation("Invalid email address".into()));
        }
        prefs.email = Some(email).filter(|e| !e.is_empty());
    }
    if let Some(day) = payload.digest_send_day {
        if !(0..=6).contains(&day) {
            return Err(AppError::Validation("digest_send_day must be between 0 (Sunday) and 6".into()));
        }
        prefs.digest_send_day = Some(day);
    }
    if let Some(v) = payload.email_enabled { prefs.email_enabled = v; }
    if let Some(v) = payload.email_for_new_reviews { prefs.email_for_new_reviews = v; }
    if let Some(v) = payload.email_for_negative_reviews { prefs.email_for_negative_reviews = v; }
    if let Some(v) = payload.email_digest { prefs.email_digest = v; }

    if prefs.email_digest == DigestFrequency::Weekly && prefs.digest_send_day.is_none() {
        prefs.digest_send_day = Some(DEFAULT_DIGEST_DAY);
    }
    prefs.updated_at = Utc::now();

    let saved = state.notification_prefs_repo.upsert(&prefs).await?;
    info!("Notification preferences updated for tenant {}", saved.tenant_id);
    Ok(Json(saved))
}

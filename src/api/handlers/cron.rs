use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use crate::api::extractors::cron::CronAuth;
use crate::state::AppState;
use crate::error::AppError;

pub async fn sync_reviews(
    State(state): State<Arc<AppState>>,
    _auth: CronAuth,
) -> Result<impl IntoResponse, AppError> {
    info!("Cron: review sync triggered");
    let report = state.review_sync().sync_all().await?;
    Ok(Json(report))
}

pub async fn send_digests(
    State(state): State<Arc<AppState>>,
    _auth: CronAuth,
) -> Result<impl IntoResponse, AppError> {
    info!("Cron: digest run triggered");
    let report = state.digest_service().send_due(Utc::now()).await?;
    Ok(Json(report))
}

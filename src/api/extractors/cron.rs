use axum::{
    extract::{FromRequestParts, FromRef},
    http::{header, request::Parts},
};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::warn;
use crate::state::AppState;
use crate::error::AppError;

pub struct CronAuth;

// Compares digests so the check does not leak the secret's prefix through timing.
fn secrets_match(presented: &str, expected: &str) -> bool {
    let a = Sha256::digest(presented.as_bytes());
    let b = Sha256::digest(expected.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

impl<S> FromRequestParts<S> for CronAuth
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);

        let presented = parts.headers.get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(AppError::Unauthorized)?;

        if app_state.config.cron_secret.is_empty() || !secrets_match(presented, &app_state.config.cron_secret) {
            warn!("Rejected cron request with invalid secret");
            return Err(AppError::Unauthorized);
        }

        Ok(CronAuth)
    }
}

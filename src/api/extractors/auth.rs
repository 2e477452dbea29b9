use axum::{
    extract::{FromRequestParts, FromRef},
    http::{header, request::Parts, Method},
};
use crate::state::AppState;
use crate::domain::models::auth::{Actor, Claims};
use crate::error::AppError;
use std::sync::Arc;
use tower_cookies::Cookies;
use jsonwebtoken::{decode, DecodingKey, Validation, Algorithm};
use tracing::{debug, Span};

const ACCESS_TOKEN_COOKIE: &str = "access_token";

pub struct AuthUser(pub Actor);

// Where the access token came from. Only cookie sessions need the CSRF echo.
enum TokenSource {
    Bearer(String),
    Cookie(String),
}

fn extract_token(parts: &Parts) -> Option<TokenSource> {
    let bearer = parts.headers.get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(TokenSource::Bearer(token));
    }

    parts.extensions.get::<Cookies>()
        .and_then(|cookies| cookies.get(ACCESS_TOKEN_COOKIE))
        .map(|cookie| TokenSource::Cookie(cookie.value().to_string()))
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let source = extract_token(parts).ok_or(AppError::Unauthorized)?;
        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);

        let decoding_key = DecodingKey::from_ed_pem(app_state.config.jwt_public_key.as_bytes())
            .map_err(|e| AppError::InternalWithMsg(format!("Invalid JWT public key: {}", e)))?;

        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.set_audience(&[app_state.config.auth_audience.as_str()]);

        let access_token = match &source {
            TokenSource::Bearer(t) | TokenSource::Cookie(t) => t,
        };
        let token_data = decode::<Claims>(access_token, &decoding_key, &validation)
            .map_err(|e| {
                debug!("Access token rejected: {}", e);
                AppError::Unauthorized
            })?;

        let method = &parts.method;
        let is_mutating = method != Method::GET && method != Method::HEAD && method != Method::OPTIONS;
        if matches!(source, TokenSource::Cookie(_)) && is_mutating {
            let csrf_header_val = parts.headers.get("X-CSRF-Token")
                .and_then(|v| v.to_str().ok())
                .ok_or(AppError::Unauthorized)?;

            if token_data.claims.csrf_token.as_deref() != Some(csrf_header_val) {
                return Err(AppError::Unauthorized);
            }
        }

        let actor = Actor {
            user_id: token_data.claims.sub,
            tenant_id: token_data.claims.tenant_id,
        };

        Span::current().record("tenant_id", &actor.tenant_id);
        Span::current().record("user_id", &actor.user_id);

        Ok(AuthUser(actor))
    }
}

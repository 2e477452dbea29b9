use axum::{
    body::Body,
    extract::Request,
    routing::{get, post, put, delete},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{health, cron, business, brand, review, response, usage, notification};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tower_cookies::CookieManagerLayer;
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Scheduler
        .route("/api/cron/reviews", get(cron::sync_reviews).post(cron::sync_reviews))
        .route("/api/cron/digest", get(cron::send_digests).post(cron::send_digests))

        // Businesses
        .route("/api/v1/businesses", get(business::list_businesses).post(business::create_business))
        .route("/api/v1/businesses/{id}", delete(business::deactivate_business))
        .route("/api/v1/businesses/{id}/connection", put(business::update_connection))
        .route("/api/v1/businesses/{id}/sync", post(business::sync_business))
        .route("/api/v1/businesses/{id}/brand-settings", get(brand::get_brand_settings).put(brand::update_brand_settings))
        .route("/api/v1/businesses/{id}/reviews", get(review::list_reviews))

        // Responses
        .route("/api/v1/reviews/{id}/responses", post(response::generate_response).get(response::list_responses))
        .route("/api/v1/responses/{id}", get(response::get_response))
        .route("/api/v1/responses/{id}/content", put(response::edit_response))
        .route("/api/v1/responses/{id}/approve", post(response::approve_response))
        .route("/api/v1/responses/{id}/publish", post(response::publish_response))
        .route("/api/v1/responses/{id}/reject", post(response::reject_response))

        // Account
        .route("/api/v1/usage", get(usage::get_usage))
        .route("/api/v1/notification-preferences", get(notification::get_preferences).put(notification::update_preferences))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        tenant_id = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .layer(CookieManagerLayer::new())
        .with_state(state)
}

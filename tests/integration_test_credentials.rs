mod common;

use axum::{http::StatusCode, response::IntoResponse, routing::post, Form, Json, Router};
use chrono::{Duration, Utc};
use common::TestApp;
use review_backend::{
    domain::{models::credential::{ExternalCredential, GOOGLE_PROVIDER}, ports::CredentialStore},
    error::AppError,
    infra::google::oauth_store::OAuthCredentialStore,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

async fn token_server(status: StatusCode) -> (String, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let router = Router::new().route("/token", post(move |Form(form): Form<HashMap<String, String>>| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            assert_eq!(form.get("grant_type").map(String::as_str), Some("refresh_token"));
            assert_eq!(form.get("refresh_token").map(String::as_str), Some("refresh-1"));
            if status.is_success() {
                Json(json!({"access_token": "fresh-token", "expires_in": 3599, "token_type": "Bearer"})).into_response()
            } else {
                (status, Json(json!({"error": "invalid_grant"}))).into_response()
            }
        }
    }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{}/token", addr), calls)
}

fn store(app: &TestApp, token_url: String) -> OAuthCredentialStore {
    OAuthCredentialStore::new(app.state.credential_repo.clone(), token_url, "client".into(), "secret".into())
}

#[tokio::test]
async fn test_missing_credential_is_not_connected() {
    let app = TestApp::new().await;
    let tenant = app.seed_tenant("Unlinked").await;
    let (url, calls) = token_server(StatusCode::OK).await;

    let err = store(&app, url).access_token(&tenant.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotConnected));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_valid_token_is_used_as_is() {
    let app = TestApp::new().await;
    let tenant = app.seed_tenant("Linked").await;
    let credential = ExternalCredential::new(
        tenant.id.clone(),
        "still-good".into(),
        Some("refresh-1".into()),
        Some(Utc::now() + Duration::hours(1)),
    );
    app.state.credential_repo.upsert(&credential).await.unwrap();
    let (url, calls) = token_server(StatusCode::OK).await;

    assert_eq!(store(&app, url).access_token(&tenant.id).await.unwrap(), "still-good");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_expired_token_is_refreshed_and_stored() {
    let app = TestApp::new().await;
    let tenant = app.seed_tenant("Expired").await;
    let credential = ExternalCredential::new(
        tenant.id.clone(),
        "stale".into(),
        Some("refresh-1".into()),
        Some(Utc::now() - Duration::minutes(5)),
    );
    app.state.credential_repo.upsert(&credential).await.unwrap();
    let (url, calls) = token_server(StatusCode::OK).await;

    assert_eq!(store(&app, url).access_token(&tenant.id).await.unwrap(), "fresh-token");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let stored = app.state.credential_repo.find_active(&tenant.id, GOOGLE_PROVIDER).await.unwrap().unwrap();
    assert_eq!(stored.access_token, "fresh-token");
    assert_eq!(stored.refresh_token.as_deref(), Some("refresh-1"), "Refresh token is kept when not rotated");
    assert!(stored.expires_at.unwrap() > Utc::now());
}

#[tokio::test]
async fn test_token_near_expiry_is_refreshed() {
    let app = TestApp::new().await;
    let tenant = app.seed_tenant("Almost").await;
    let credential = ExternalCredential::new(
        tenant.id.clone(),
        "about-to-expire".into(),
        Some("refresh-1".into()),
        Some(Utc::now() + Duration::seconds(10)),
    );
    app.state.credential_repo.upsert(&credential).await.unwrap();
    let (url, calls) = token_server(StatusCode::OK).await;

    assert_eq!(store(&app, url).access_token(&tenant.id).await.unwrap(), "fresh-token");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_expired_without_refresh_token_is_not_connected() {
    let app = TestApp::new().await;
    let tenant = app.seed_tenant("No Refresh").await;
    let credential = ExternalCredential::new(tenant.id.clone(), "stale".into(), None, Some(Utc::now() - Duration::hours(1)));
    app.state.credential_repo.upsert(&credential).await.unwrap();
    let (url, calls) = token_server(StatusCode::OK).await;

    let err = store(&app, url).access_token(&tenant.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotConnected));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_rejected_refresh_is_not_connected() {
    let app = TestApp::new().await;
    let tenant = app.seed_tenant("Revoked").await;
    let credential = ExternalCredential::new(
        tenant.id.clone(),
        "stale".into(),
        Some("refresh-1".into()),
        Some(Utc::now() - Duration::minutes(1)),
    );
    app.state.credential_repo.upsert(&credential).await.unwrap();
    let (url, calls) = token_server(StatusCode::BAD_REQUEST).await;

    let err = store(&app, url).access_token(&tenant.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotConnected));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let stored = app.state.credential_repo.find_active(&tenant.id, GOOGLE_PROVIDER).await.unwrap().unwrap();
    assert_eq!(stored.access_token, "stale", "A failed refresh leaves the stored token alone");
}

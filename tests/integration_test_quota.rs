mod common;

use axum::http::StatusCode;
use common::TestApp;
use review_backend::domain::models::{
    subscription::{PlanTier, Subscription},
    usage::{UsageAction, UsageLedgerEntry},
};
use serde_json::json;
use chrono::{Duration, Utc};

async fn record_responses(app: &TestApp, tenant_id: &str, n: usize) {
    for _ in 0..n {
        let entry = UsageLedgerEntry::new(tenant_id.to_string(), None, UsageAction::AiResponse, 200, 9);
        app.state.usage_repo.record(&entry).await.unwrap();
    }
}

#[tokio::test]
async fn test_free_tier_without_subscription() {
    let app = TestApp::new().await;
    let tenant = app.seed_tenant("Solo").await;
    let token = app.token_for(&tenant.id, "u1");

    let (status, body) = app.send("GET", "/api/v1/usage", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["responses"]["plan"], "free");
    assert_eq!(body["responses"]["limit"], 5);
    assert_eq!(body["responses"]["used"], 0);
    assert_eq!(body["responses"]["remaining"], 5);
    assert_eq!(body["responses"]["allowed"], true);
    assert!(body["responses"].get("reason").is_none());
    assert_eq!(body["locations"]["limit"], 1);
}

#[tokio::test]
async fn test_response_quota_is_monotonic_until_blocked() {
    let app = TestApp::new().await;
    let tenant = app.seed_tenant("Starter Shop").await;
    app.seed_subscription(&tenant.id, "starter").await;
    let quota = app.state.quota();

    let mut last_used = -1;
    for _ in 0..3 {
        let check = quota.check_response_quota(&tenant.id).await.unwrap();
        assert!(check.used > last_used);
        assert_eq!(check.remaining, 50 - check.used);
        last_used = check.used;
        record_responses(&app, &tenant.id, 1).await;
    }

    record_responses(&app, &tenant.id, 47).await;
    let check = quota.check_response_quota(&tenant.id).await.unwrap();
    assert_eq!(check.used, 50);
    assert!(!check.allowed);
    assert_eq!(check.remaining, 0);
    assert_eq!(
        check.reason.as_deref(),
        Some("You have reached your starter plan limit of 50 AI responses. Upgrade your plan to continue generating responses.")
    );
}

#[tokio::test]
async fn test_unlimited_plans_never_block() {
    let app = TestApp::new().await;
    let tenant = app.seed_tenant("Big Agency").await;
    app.seed_subscription(&tenant.id, "agency").await;
    record_responses(&app, &tenant.id, 250).await;

    let responses = app.state.quota().check_response_quota(&tenant.id).await.unwrap();
    assert!(responses.allowed);
    assert_eq!(responses.limit, -1);
    assert_eq!(responses.remaining, -1);
    assert_eq!(responses.used, 250);

    let locations = app.state.quota().check_location_quota(&tenant.id).await.unwrap();
    assert!(locations.allowed);
    assert_eq!(locations.limit, -1);
}

#[tokio::test]
async fn test_plan_resolution() {
    let app = TestApp::new().await;
    let quota = app.state.quota();

    let canceled = app.seed_tenant("Canceled").await;
    let sub = Subscription::new(canceled.id.clone(), "canceled", Some("business"));
    app.state.subscription_repo.create(&sub).await.unwrap();
    assert_eq!(quota.check_response_quota(&canceled.id).await.unwrap().plan, PlanTier::Free);

    let trialing = app.seed_tenant("Trialing").await;
    let sub = Subscription::new(trialing.id.clone(), "trialing", Some("professional"));
    app.state.subscription_repo.create(&sub).await.unwrap();
    assert_eq!(quota.check_response_quota(&trialing.id).await.unwrap().limit, 200);

    let unknown = app.seed_tenant("Legacy").await;
    app.seed_subscription(&unknown.id, "enterprise-2019").await;
    assert_eq!(quota.check_response_quota(&unknown.id).await.unwrap().plan, PlanTier::Free);
}

#[tokio::test]
async fn test_usage_counts_from_current_period() {
    let app = TestApp::new().await;
    let tenant = app.seed_tenant("Renewed").await;

    let mut old = UsageLedgerEntry::new(tenant.id.clone(), None, UsageAction::AiResponse, 100, 5);
    old.created_at = Utc::now() - Duration::days(40);
    app.state.usage_repo.record(&old).await.unwrap();

    let mut sub = Subscription::new(tenant.id.clone(), "active", Some("free"));
    sub.current_period_start = Some(Utc::now() - Duration::days(2));
    app.state.subscription_repo.create(&sub).await.unwrap();
    record_responses(&app, &tenant.id, 2).await;

    let check = app.state.quota().check_response_quota(&tenant.id).await.unwrap();
    assert_eq!(check.used, 2, "Entries before the period start do not count");
}

#[tokio::test]
async fn test_location_quota_gates_business_creation() {
    let app = TestApp::new().await;
    let tenant = app.seed_tenant("Two Shops").await;
    let token = app.token_for(&tenant.id, "u1");

    let (status, first) = app.send("POST", "/api/v1/businesses", Some(&token), Some(json!({"name": "Shop One"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["is_active"], true);

    let (status, body) = app.send("POST", "/api/v1/businesses", Some(&token), Some(json!({"name": "Shop Two"}))).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert!(body["message"].as_str().unwrap().contains("1 business locations"));

    // Deactivated locations free their slot.
    let id = first["id"].as_str().unwrap();
    let (status, _) = app.send("DELETE", &format!("/api/v1/businesses/{}", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.send("POST", "/api/v1/businesses", Some(&token), Some(json!({"name": "Shop Two"}))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, listed) = app.send("GET", "/api/v1/businesses", Some(&token), None).await;
    assert_eq!(listed.as_array().unwrap().len(), 2, "Deactivated businesses are kept");
}

#[tokio::test]
async fn test_connection_update() {
    let app = TestApp::new().await;
    let tenant = app.seed_tenant("Connector").await;
    let token = app.token_for(&tenant.id, "u1");
    let business = app.seed_business(&tenant.id, "Connector", false).await;

    let (status, body) = app.send(
        "PUT",
        &format!("/api/v1/businesses/{}/connection", business.id),
        Some(&token),
        Some(json!({"gmb_account_id": "123", "gmb_location_id": "456", "gmb_location_name": "Main St"})),
    ).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["gmb_location_id"], "456");

    let (status, _) = app.send(
        "PUT",
        &format!("/api/v1/businesses/{}/connection", business.id),
        Some(&token),
        Some(json!({"gmb_account_id": "123", "gmb_location_id": " "})),
    ).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

mod common;

use axum::http::StatusCode;
use common::{external_review, TestApp};
use review_backend::background::run_pending_jobs;
use review_backend::domain::models::notification::NotificationPreferences;
use serde_json::json;

async fn job_statuses(app: &TestApp) -> Vec<(String, Option<String>)> {
    sqlx::query_as::<_, (String, Option<String>)>("SELECT status, error_message FROM jobs ORDER BY created_at")
        .fetch_all(&app.pool)
        .await
        .unwrap()
}

async fn emails_recorded(app: &TestApp, tenant_id: &str) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM usage_ledger WHERE tenant_id = ? AND action = 'email_sent'")
        .bind(tenant_id)
        .fetch_one(&app.pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_new_review_alert_flows_through_job_queue() {
    let app = TestApp::with_job_queue().await;
    let tenant = app.seed_tenant("Pizzeria").await;
    let business = app.seed_business(&tenant.id, "Pizzeria Roma", true).await;
    app.state.notification_prefs_repo
        .upsert(&NotificationPreferences::defaults_for(&tenant.id))
        .await
        .unwrap();

    app.source.set_reviews(&business.location_ref().unwrap(), vec![external_review("g-p1", 2, "Soggy crust, slow service")]);
    app.state.review_sync().sync_business(&business).await.unwrap();

    let queued = job_statuses(&app).await;
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].0, "PENDING");
    assert!(app.email.sent.lock().unwrap().is_empty(), "Sync only queues the alert");

    run_pending_jobs(&app.state).await;

    let sent = app.email.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, "pizzeria@example.com", "Falls back to the tenant email");
    assert_eq!(sent[0].subject, "New 2-star review for Pizzeria Roma");
    assert!(sent[0].html.contains("Soggy crust"));
    assert!(sent[0].html.contains("★★☆☆☆"));

    assert_eq!(job_statuses(&app).await[0].0, "COMPLETED");
    assert_eq!(emails_recorded(&app, &tenant.id).await, 1);

    // A second pass finds nothing left to claim.
    run_pending_jobs(&app.state).await;
    assert_eq!(app.email.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_alert_without_preferences_is_skipped() {
    let app = TestApp::with_job_queue().await;
    let tenant = app.seed_tenant("Quiet Shop").await;
    let business = app.seed_business(&tenant.id, "Quiet Shop", true).await;
    app.source.set_reviews(&business.location_ref().unwrap(), vec![external_review("g-q1", 5, "Lovely")]);

    app.state.review_sync().sync_business(&business).await.unwrap();
    run_pending_jobs(&app.state).await;

    let statuses = job_statuses(&app).await;
    assert_eq!(statuses[0].0, "SKIPPED");
    assert_eq!(statuses[0].1.as_deref(), Some("no notification preferences"));
    assert!(app.email.sent.lock().unwrap().is_empty());
    assert_eq!(emails_recorded(&app, &tenant.id).await, 0);
}

#[tokio::test]
async fn test_alert_gating_by_rating_category() {
    let app = TestApp::with_job_queue().await;
    let tenant = app.seed_tenant("Hotel").await;
    let business = app.seed_business(&tenant.id, "Hotel Bay", true).await;

    let mut prefs = NotificationPreferences::defaults_for(&tenant.id);
    prefs.email = Some("alerts@hotel.test".to_string());
    prefs.email_for_new_reviews = false;
    app.state.notification_prefs_repo.upsert(&prefs).await.unwrap();

    app.source.set_reviews(&business.location_ref().unwrap(), vec![
        external_review("g-h1", 5, "Great view"),
        external_review("g-h2", 1, "Noisy room"),
    ]);
    app.state.review_sync().sync_business(&business).await.unwrap();
    run_pending_jobs(&app.state).await;

    let sent = app.email.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1, "Only the negative review alerts");
    assert_eq!(sent[0].recipient, "alerts@hotel.test");
    assert!(sent[0].subject.starts_with("New 1-star review"));

    let mut statuses: Vec<String> = job_statuses(&app).await.into_iter().map(|(s, _)| s).collect();
    statuses.sort();
    assert_eq!(statuses, vec!["COMPLETED".to_string(), "SKIPPED".to_string()]);
}

#[tokio::test]
async fn test_master_switch_disables_all_alerts() {
    let app = TestApp::with_job_queue().await;
    let tenant = app.seed_tenant("Muted").await;
    let business = app.seed_business(&tenant.id, "Muted", true).await;

    let mut prefs = NotificationPreferences::defaults_for(&tenant.id);
    prefs.email_enabled = false;
    app.state.notification_prefs_repo.upsert(&prefs).await.unwrap();

    app.source.set_reviews(&business.location_ref().unwrap(), vec![external_review("g-m1", 1, "Bad")]);
    app.state.review_sync().sync_business(&business).await.unwrap();
    run_pending_jobs(&app.state).await;

    assert!(app.email.sent.lock().unwrap().is_empty());
    assert_eq!(job_statuses(&app).await[0].0, "SKIPPED");
}

#[tokio::test]
async fn test_preferences_endpoints() {
    let app = TestApp::new().await;
    let tenant = app.seed_tenant("Prefs").await;
    let token = app.token_for(&tenant.id, "u1");

    let (status, body) = app.send("GET", "/api/v1/notification-preferences", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email_enabled"], true);
    assert_eq!(body["email_digest"], "none");
    assert!(body["digest_send_day"].is_null());

    let (status, body) = app.send(
        "PUT",
        "/api/v1/notification-preferences",
        Some(&token),
        Some(json!({"email_digest": "weekly", "email_for_new_reviews": false, "email": " owner@prefs.test "})),
    ).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email_digest"], "weekly");
    assert_eq!(body["digest_send_day"], 1, "Weekly digests default to Monday");
    assert_eq!(body["email"], "owner@prefs.test");
    assert_eq!(body["email_for_new_reviews"], false);

    let (_, body) = app.send("GET", "/api/v1/notification-preferences", Some(&token), None).await;
    assert_eq!(body["email_digest"], "weekly");
    assert_eq!(body["email_for_negative_reviews"], true);

    let (status, body) = app.send(
        "PUT",
        "/api/v1/notification-preferences",
        Some(&token),
        Some(json!({"digest_send_day": 7})),
    ).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation");

    let (status, _) = app.send(
        "PUT",
        "/api/v1/notification-preferences",
        Some(&token),
        Some(json!({"email": "not-an-email"})),
    ).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_preferences_require_authentication() {
    let app = TestApp::new().await;
    let (status, body) = app.send("GET", "/api/v1/notification-preferences", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

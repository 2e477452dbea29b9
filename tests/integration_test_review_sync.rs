mod common;

use axum::http::StatusCode;
use common::{external_review, TestApp, CRON_SECRET};
use review_backend::domain::models::{review::Sentiment, usage::UsageAction};

#[tokio::test]
async fn test_sync_empty_business() {
    let app = TestApp::new().await;
    let tenant = app.seed_tenant("Empty Cafe").await;
    let business = app.seed_business(&tenant.id, "Empty Cafe", true).await;

    let outcome = app.state.review_sync().sync_business(&business).await.unwrap();
    assert_eq!(outcome.reviews_count, 0);
    assert_eq!(outcome.new_reviews, 0);

    let reloaded = app.state.business_repo.find_by_id(&tenant.id, &business.id).await.unwrap().unwrap();
    assert!(reloaded.last_synced_at.is_some(), "Successful sync stamps last_synced_at");
    assert!(app.notifier.notified.lock().unwrap().is_empty());
    assert_eq!(app.state.usage_repo.count_since(&tenant.id, UsageAction::AiResponse, None).await.unwrap(), 0);
    assert_eq!(app.state.usage_repo.count_since(&tenant.id, UsageAction::EmailSent, None).await.unwrap(), 0);
}

#[tokio::test]
async fn test_sync_is_idempotent() {
    let app = TestApp::new().await;
    let tenant = app.seed_tenant("Bakery").await;
    let business = app.seed_business(&tenant.id, "Bakery", true).await;
    let location = business.location_ref().unwrap();

    app.source.set_reviews(&location, vec![
        external_review("g-1", 5, "Best croissants in town"),
        external_review("g-2", 3, "Fine, a bit slow"),
    ]);

    let first = app.state.review_sync().sync_business(&business).await.unwrap();
    assert_eq!(first.new_reviews, 2);

    let second = app.state.review_sync().sync_business(&business).await.unwrap();
    assert_eq!(second.reviews_count, 2);
    assert_eq!(second.new_reviews, 0, "Re-sync must not report existing rows as new");

    let reviews = app.state.review_repo.list_by_business(&business.id, 50).await.unwrap();
    assert_eq!(reviews.len(), 2);
    assert_eq!(app.notifier.notified.lock().unwrap().len(), 2, "Only fresh inserts notify");
}

#[tokio::test]
async fn test_new_one_star_review_is_negative_and_notified() {
    let app = TestApp::new().await;
    let tenant = app.seed_tenant("Diner").await;
    let business = app.seed_business(&tenant.id, "Diner", true).await;
    app.source.set_reviews(&business.location_ref().unwrap(), vec![external_review("g-bad", 1, "Cold food")]);

    app.state.review_sync().sync_business(&business).await.unwrap();

    let reviews = app.state.review_repo.list_by_business(&business.id, 50).await.unwrap();
    assert_eq!(reviews[0].sentiment, Sentiment::Negative);
    assert!(!reviews[0].is_responded);
    assert_eq!(app.notifier.notified.lock().unwrap().as_slice(), ["g-bad".to_string()]);
}

#[tokio::test]
async fn test_resync_preserves_local_state() {
    let app = TestApp::new().await;
    let tenant = app.seed_tenant("Salon").await;
    let business = app.seed_business(&tenant.id, "Salon", true).await;
    let location = business.location_ref().unwrap();

    app.source.set_reviews(&location, vec![
        external_review("g-a", 5, "Lovely"),
        external_review("g-b", 4, "Good cut"),
    ]);
    app.state.review_sync().sync_business(&business).await.unwrap();

    sqlx::query("UPDATE reviews SET is_responded = 1 WHERE external_review_id = 'g-a'")
        .execute(&app.pool).await.unwrap();
    sqlx::query("UPDATE reviews SET sentiment = 'neutral' WHERE external_review_id = 'g-b'")
        .execute(&app.pool).await.unwrap();

    // g-a drops to one star upstream, g-b keeps its rating but edits its text.
    app.source.set_reviews(&location, vec![
        external_review("g-a", 1, "Changed my mind"),
        external_review("g-b", 4, "Good cut, friendly staff"),
    ]);
    app.state.review_sync().sync_business(&business).await.unwrap();

    let reviews = app.state.review_repo.list_by_business(&business.id, 50).await.unwrap();
    let a = reviews.iter().find(|r| r.external_review_id == "g-a").unwrap();
    let b = reviews.iter().find(|r| r.external_review_id == "g-b").unwrap();

    assert!(a.is_responded, "is_responded never flips back");
    assert_eq!(a.star_rating, 1);
    assert_eq!(a.sentiment, Sentiment::Negative, "Rating change re-derives sentiment");

    assert_eq!(b.review_text, "Good cut, friendly staff");
    assert_eq!(b.sentiment, Sentiment::Neutral, "Unchanged rating keeps stored sentiment");
}

#[tokio::test]
async fn test_cron_sync_isolates_failures() {
    let app = TestApp::new().await;
    let tenant = app.seed_tenant("Chain").await;
    let healthy = app.seed_business(&tenant.id, "Chain North", true).await;
    let broken = app.seed_business(&tenant.id, "Chain South", true).await;
    let _unconnected = app.seed_business(&tenant.id, "Chain East", false).await;

    app.source.set_reviews(&healthy.location_ref().unwrap(), vec![external_review("g-n1", 5, "Great")]);
    app.source.fail_location(&broken.location_ref().unwrap());

    let (status, body) = app.send("POST", "/api/cron/reviews", Some(CRON_SECRET), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["synced"], 1);
    assert_eq!(body["errors"], 1);

    let entries = body["businesses"].as_array().unwrap();
    assert_eq!(entries.len(), 2, "Unconnected businesses are not synced");

    let find = |id: &str| entries.iter().find(|e| e["id"] == id).unwrap();
    assert_eq!(find(healthy.id.as_str())["status"], "success");
    assert_eq!(find(healthy.id.as_str())["newReviews"], 1);
    assert!(find(broken.id.as_str())["status"].as_str().unwrap().starts_with("error: "));
    assert_eq!(find(broken.id.as_str())["reviewsCount"], 0);
}

#[tokio::test]
async fn test_cron_rejects_missing_or_wrong_secret() {
    let app = TestApp::new().await;

    let (status, _) = app.send("GET", "/api/cron/reviews", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.send("POST", "/api/cron/reviews", Some("not-the-secret"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = app.send("GET", "/api/cron/digest", Some("not-the-secret"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.source.list_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_manual_sync_endpoint() {
    let app = TestApp::new().await;
    let tenant = app.seed_tenant("Gym").await;
    let token = app.token_for(&tenant.id, "user-1");
    let connected = app.seed_business(&tenant.id, "Gym", true).await;
    app.source.set_reviews(&connected.location_ref().unwrap(), vec![external_review("g-gym", 4, "Clean")]);

    let (status, body) = app.send("POST", &format!("/api/v1/businesses/{}/sync", connected.id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["new_reviews"], 1);

    let (status, body) = app.send("GET", &format!("/api/v1/businesses/{}/reviews", connected.id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["sentiment"], "positive");
}

#[tokio::test]
async fn test_manual_sync_requires_connection() {
    let app = TestApp::new().await;
    let tenant = app.seed_tenant("Florist").await;
    let token = app.token_for(&tenant.id, "user-1");
    let business = app.seed_business(&tenant.id, "Florist", false).await;

    let (status, body) = app.send("POST", &format!("/api/v1/businesses/{}/sync", business.id), Some(&token), None).await;
    assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    assert_eq!(body["error"], "not_connected");

    let other = app.seed_tenant("Intruder").await;
    let other_token = app.token_for(&other.id, "user-2");
    let (status, _) = app.send("POST", &format!("/api/v1/businesses/{}/sync", business.id), Some(&other_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "Businesses are tenant scoped");
}

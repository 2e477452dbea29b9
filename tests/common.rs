#![allow(dead_code)]

use review_backend::{
    api::router::create_router,
    state::AppState,
    config::{Config, RetryPolicy},
    infra::factory::{assemble_state, run_sqlite_migrations, Repositories},
    infra::notifications::job_queue_notifier::JobQueueNotifier,
    domain::models::{
        ai::{Completion, CompletionRequest},
        auth::Claims,
        business::{Business, LocationRef},
        review::{ExternalReview, PostedReply, Review},
        subscription::Subscription,
        tenant::Tenant,
    },
    domain::ports::{EmailService, LlmService, NotificationSender, ReviewSource},
    error::AppError,
};
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions}, Pool, Sqlite};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use uuid::Uuid;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    Router,
};
use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use tower::ServiceExt;
use serde_json::Value;

pub const CRON_SECRET: &str = "test-cron-secret";
pub const AUDIENCE: &str = "review-frontend";

#[derive(Default)]
pub struct MockReviewSource {
    pub reviews: Mutex<HashMap<String, Vec<ExternalReview>>>,
    pub failing_locations: Mutex<HashSet<String>>,
    pub fail_posts: AtomicBool,
    pub list_calls: AtomicUsize,
    pub post_calls: AtomicUsize,
    pub posted: Mutex<Vec<(String, String)>>,
}

impl MockReviewSource {
    pub fn set_reviews(&self, location: &LocationRef, reviews: Vec<ExternalReview>) {
        self.reviews.lock().unwrap().insert(location.location_name.clone(), reviews);
    }

    pub fn fail_location(&self, location: &LocationRef) {
        self.failing_locations.lock().unwrap().insert(location.location_name.clone());
    }
}

#[async_trait]
impl ReviewSource for MockReviewSource {
    async fn list_reviews(&self, _tenant_id: &str, location: &LocationRef) -> Result<Vec<ExternalReview>, AppError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_locations.lock().unwrap().contains(&location.location_name) {
            return Err(AppError::UpstreamRejected { status: 500, message: "backend error".into() });
        }
        Ok(self.reviews.lock().unwrap().get(&location.location_name).cloned().unwrap_or_default())
    }

    async fn post_reply(
        &self,
        _tenant_id: &str,
        _location: &LocationRef,
        external_review_id: &str,
        text: &str,
    ) -> Result<PostedReply, AppError> {
        self.post_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_posts.load(Ordering::SeqCst) {
            return Err(AppError::RateLimited { attempts: 3 });
        }
        self.posted.lock().unwrap().push((external_review_id.to_string(), text.to_string()));
        Ok(PostedReply {
            external_reply_id: format!("{}/reply", external_review_id),
            published_at: Utc::now(),
        })
    }
}

pub struct MockLlmService {
    pub content: Mutex<String>,
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
    pub last_request: Mutex<Option<CompletionRequest>>,
}

impl Default for MockLlmService {
    fn default() -> Self {
        Self {
            content: Mutex::new("Thank you so much for your kind words! We look forward to seeing you again.".to_string()),
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }
}

#[async_trait]
impl LlmService for MockLlmService {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::GenerationFailed("provider returned 500".into()));
        }
        Ok(Completion {
            content: self.content.lock().unwrap().clone(),
            tokens_used: 300,
            model: "gpt-4o-mini".to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub recipient: String,
    pub subject: String,
    pub html: String,
}

#[derive(Default)]
pub struct MockEmailService {
    pub sent: Mutex<Vec<SentEmail>>,
}

#[async_trait]
impl EmailService for MockEmailService {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(SentEmail {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            html: html_body.to_string(),
        });
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub notified: Mutex<Vec<String>>,
}

#[async_trait]
impl NotificationSender for RecordingNotifier {
    async fn notify_new_review(&self, _tenant_id: &str, _business: &Business, review: &Review) -> Result<(), AppError> {
        self.notified.lock().unwrap().push(review.external_review_id.clone());
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub source: Arc<MockReviewSource>,
    pub llm: Arc<MockLlmService>,
    pub email: Arc<MockEmailService>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn test_config(db_url: &str) -> Config {
    Config {
        database_url: db_url.to_string(),
        port: 0,
        jwt_public_key: include_str!("../tests/keys/test_public.pem").to_string(),
        auth_audience: AUDIENCE.to_string(),
        cron_secret: CRON_SECRET.to_string(),
        openai_api_key: String::new(),
        openai_base_url: "http://localhost".to_string(),
        openai_model: "gpt-4o-mini".to_string(),
        google_client_id: String::new(),
        google_client_secret: String::new(),
        google_token_url: "http://localhost/token".to_string(),
        gbp_api_base: "http://localhost".to_string(),
        mail_service_url: "http://localhost".to_string(),
        mail_service_token: String::new(),
        mail_from: "Reviews <noreply@test.local>".to_string(),
        app_url: "https://app.test".to_string(),
        sync_delay: Duration::ZERO,
        upstream_retry: RetryPolicy {
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(50),
            max_attempts: 3,
        },
        review_sync_interval: None,
        semantic_sentiment: false,
    }
}

impl TestApp {
    // New-review notifications are captured by a `RecordingNotifier`.
    pub async fn new() -> Self {
        Self::build(false).await
    }

    // New-review notifications go through the job queue, as in production.
    pub async fn with_job_queue() -> Self {
        Self::build(true).await
    }

    async fn build(job_queue: bool) -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        run_sqlite_migrations(&pool).await;

        let config = test_config(&db_url);
        let repos = Repositories::sqlite(&pool);
        let job_repo = repos.job.clone();
        let mut state = assemble_state(&config, repos);

        let source = Arc::new(MockReviewSource::default());
        let llm = Arc::new(MockLlmService::default());
        let email = Arc::new(MockEmailService::default());
        let notifier = Arc::new(RecordingNotifier::default());

        state.review_source = source.clone() as Arc<dyn ReviewSource>;
        state.llm_service = llm.clone() as Arc<dyn LlmService>;
        state.email_service = email.clone() as Arc<dyn EmailService>;
        state.notifier = if job_queue {
            Arc::new(JobQueueNotifier::new(job_repo)) as Arc<dyn NotificationSender>
        } else {
            notifier.clone() as Arc<dyn NotificationSender>
        };

        let state = Arc::new(state);
        let router = create_router(state.clone());

        Self { router, pool, db_filename, state, source, llm, email, notifier }
    }

    pub fn token_for(&self, tenant_id: &str, user_id: &str) -> String {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            iss: "test-issuer".to_string(),
            sub: user_id.to_string(),
            aud: AUDIENCE.to_string(),
            exp: now + 3600,
            iat: now,
            tenant_id: tenant_id.to_string(),
            csrf_token: None,
        };
        let key = EncodingKey::from_ed_pem(include_bytes!("../tests/keys/test_private.pem")).unwrap();
        encode(&Header::new(Algorithm::EdDSA), &claims, &key).unwrap()
    }

    pub async fn seed_tenant(&self, name: &str) -> Tenant {
        let email = format!("{}@example.com", name.to_lowercase().replace(' ', "."));
        self.state.tenant_repo.create(&Tenant::new(name.to_string(), email)).await.unwrap()
    }

    pub async fn seed_business(&self, tenant_id: &str, name: &str, connected: bool) -> Business {
        let mut business = Business::new(tenant_id.to_string(), name.to_string());
        if connected {
            business.gmb_account_id = Some(format!("acct-{}", Uuid::new_v4()));
            business.gmb_location_id = Some(format!("loc-{}", Uuid::new_v4()));
        }
        self.state.business_repo.create(&business).await.unwrap()
    }

    pub async fn seed_subscription(&self, tenant_id: &str, plan_type: &str) -> Subscription {
        let subscription = Subscription::new(tenant_id.to_string(), "active", Some(plan_type));
        self.state.subscription_repo.create(&subscription).await.unwrap()
    }

    pub async fn seed_review(&self, business_id: &str, rating: i32, text: &str) -> Review {
        let external = external_review(&format!("ext-{}", Uuid::new_v4()), rating, text);
        self.state.review_repo
            .upsert(&Review::from_external(business_id, &external))
            .await
            .unwrap()
            .review
    }

    pub async fn send(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
        (status, json)
    }
}

pub fn external_review(id: &str, rating: i32, text: &str) -> ExternalReview {
    ExternalReview {
        external_review_id: id.to_string(),
        author_name: "Jane Doe".to_string(),
        author_photo_url: None,
        star_rating: rating,
        text: text.to_string(),
        created_at: Some(Utc::now()),
        updated_at: Some(Utc::now()),
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
    }
}

use crate::domain::models::{
    ai::{Completion, CompletionRequest},
    brand::BrandSettings,
    business::{Business, LocationRef},
    credential::ExternalCredential,
    job::Job,
    notification::NotificationPreferences,
    response::Response,
    review::{ExternalReview, PostedReply, Review, Sentiment, UpsertOutcome},
    subscription::Subscription,
    tenant::Tenant,
    usage::{UsageAction, UsageLedgerEntry},
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait TenantRepository: Send + Sync {
    async fn create(&self, tenant: &Tenant) -> Result<Tenant, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Tenant>, AppError>;
}

#[async_trait]
pub trait BusinessRepository: Send + Sync {
    async fn create(&self, business: &Business) -> Result<Business, AppError>;
    async fn find_by_id(&self, tenant_id: &str, id: &str) -> Result<Option<Business>, AppError>;
    async fn list_by_tenant(&self, tenant_id: &str) -> Result<Vec<Business>, AppError>;
    /// Active businesses with both external identifiers set, across all tenants.
    async fn list_syncable(&self) -> Result<Vec<Business>, AppError>;
    async fn count_active_by_tenant(&self, tenant_id: &str) -> Result<i64, AppError>;
    async fn update_connection(&self, business: &Business) -> Result<Business, AppError>;
    async fn deactivate(&self, tenant_id: &str, id: &str) -> Result<(), AppError>;
    async fn mark_synced(&self, id: &str, at: DateTime<Utc>) -> Result<(), AppError>;
}

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn upsert(&self, review: &Review) -> Result<UpsertOutcome, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Review>, AppError>;
    async fn list_by_business(&self, business_id: &str, limit: i64) -> Result<Vec<Review>, AppError>;
    async fn list_by_business_since(&self, business_id: &str, since: DateTime<Utc>) -> Result<Vec<Review>, AppError>;
    async fn update_sentiment(&self, id: &str, sentiment: Sentiment) -> Result<(), AppError>;
}

#[async_trait]
pub trait ResponseRepository: Send + Sync {
    async fn create_with_usage(&self, response: &Response, usage: &UsageLedgerEntry) -> Result<Response, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Response>, AppError>;
    async fn find_in_flight(&self, review_id: &str) -> Result<Option<Response>, AppError>;
    async fn list_by_review(&self, review_id: &str) -> Result<Vec<Response>, AppError>;
    /// Writes the mutable draft fields if the stored version still equals `expected_version`.
    /// Returns `None` when another write got there first.
    async fn update_draft(&self, response: &Response, expected_version: i32) -> Result<Option<Response>, AppError>;
    async fn record_external_reply(&self, id: &str, reply: &PostedReply) -> Result<(), AppError>;
    /// Marks the response published, flags the review as responded and bumps the business counter.
    async fn commit_publish(&self, response: &Response) -> Result<Response, AppError>;
}

#[async_trait]
pub trait UsageRepository: Send + Sync {
    async fn record(&self, entry: &UsageLedgerEntry) -> Result<(), AppError>;
    async fn count_since(&self, tenant_id: &str, action: UsageAction, since: Option<DateTime<Utc>>) -> Result<i64, AppError>;
}

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    async fn create(&self, subscription: &Subscription) -> Result<Subscription, AppError>;
    async fn find_active(&self, tenant_id: &str) -> Result<Option<Subscription>, AppError>;
}

#[async_trait]
pub trait BrandSettingsRepository: Send + Sync {
    async fn find_by_business(&self, business_id: &str) -> Result<Option<BrandSettings>, AppError>;
    async fn upsert(&self, settings: &BrandSettings) -> Result<BrandSettings, AppError>;
}

#[async_trait]
pub trait NotificationPreferencesRepository: Send + Sync {
    async fn find_by_tenant(&self, tenant_id: &str) -> Result<Option<NotificationPreferences>, AppError>;
    async fn upsert(&self, prefs: &NotificationPreferences) -> Result<NotificationPreferences, AppError>;
    async fn list_digest_subscribers(&self) -> Result<Vec<NotificationPreferences>, AppError>;
    async fn mark_digest_sent(&self, tenant_id: &str, at: DateTime<Utc>) -> Result<(), AppError>;
}

#[async_trait]
pub trait CredentialRepository: Send + Sync {
    async fn find_active(&self, tenant_id: &str, provider: &str) -> Result<Option<ExternalCredential>, AppError>;
    async fn upsert(&self, credential: &ExternalCredential) -> Result<ExternalCredential, AppError>;
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn create(&self, job: &Job) -> Result<Job, AppError>;
    async fn find_pending(&self, limit: i32) -> Result<Vec<Job>, AppError>;
    async fn update_status(&self, id: &str, status: &str, error_message: Option<String>) -> Result<(), AppError>;
}

#[async_trait]
pub trait ReviewSource: Send + Sync {
    async fn list_reviews(&self, tenant_id: &str, location: &LocationRef) -> Result<Vec<ExternalReview>, AppError>;
    async fn post_reply(
        &self,
        tenant_id: &str,
        location: &LocationRef,
        external_review_id: &str,
        text: &str,
    ) -> Result<PostedReply, AppError>;
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn access_token(&self, tenant_id: &str) -> Result<String, AppError>;
}

#[async_trait]
pub trait LlmService: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, AppError>;
}

#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Sentiment, AppError>;
}

#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn notify_new_review(&self, tenant_id: &str, business: &Business, review: &Review) -> Result<(), AppError>;
}

use std::sync::Arc;
use crate::domain::ports::{
    BrandSettingsRepository, BusinessRepository, CredentialRepository, EmailService, JobRepository,
    LlmService, NotificationPreferencesRepository, NotificationSender, ResponseRepository,
    ReviewRepository, ReviewSource, SentimentClassifier, SubscriptionRepository, TenantRepository,
    UsageRepository,
};
use crate::domain::services::{
    digest_service::DigestService, notification_service::NotificationService, quota::QuotaService,
    response_generator::ResponseGenerator, response_lifecycle::ResponseLifecycle,
    review_sync::ReviewSyncService,
};
use crate::config::Config;
use tera::Tera;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub tenant_repo: Arc<dyn TenantRepository>,
    pub business_repo: Arc<dyn BusinessRepository>,
    pub review_repo: Arc<dyn ReviewRepository>,
    pub response_repo: Arc<dyn ResponseRepository>,
    pub usage_repo: Arc<dyn UsageRepository>,
    pub subscription_repo: Arc<dyn SubscriptionRepository>,
    pub brand_settings_repo: Arc<dyn BrandSettingsRepository>,
    pub notification_prefs_repo: Arc<dyn NotificationPreferencesRepository>,
    pub credential_repo: Arc<dyn CredentialRepository>,
    pub job_repo: Arc<dyn JobRepository>,
    pub review_source: Arc<dyn ReviewSource>,
    pub llm_service: Arc<dyn LlmService>,
    pub sentiment_classifier: Option<Arc<dyn SentimentClassifier>>,
    pub email_service: Arc<dyn EmailService>,
    pub notifier: Arc<dyn NotificationSender>,
    pub templates: Arc<Tera>,
}

impl AppState {
    pub fn quota(&self) -> QuotaService {
        QuotaService::new(self.subscription_repo.clone(), self.usage_repo.clone(), self.business_repo.clone())
    }

    pub fn review_sync(&self) -> ReviewSyncService {
        let service = ReviewSyncService::new(
            self.business_repo.clone(),
            self.review_repo.clone(),
            self.review_source.clone(),
            self.notifier.clone(),
            self.config.sync_delay,
        );
        match &self.sentiment_classifier {
            Some(classifier) => service.with_classifier(classifier.clone()),
            None => service,
        }
    }

    pub fn response_generator(&self) -> ResponseGenerator {
        ResponseGenerator::new(self.response_repo.clone(), self.llm_service.clone())
    }

    pub fn response_lifecycle(&self) -> ResponseLifecycle {
        ResponseLifecycle::new(
            self.response_repo.clone(),
            self.review_repo.clone(),
            self.business_repo.clone(),
            self.review_source.clone(),
        )
    }

    pub fn notification_service(&self) -> NotificationService {
        NotificationService::new(
            self.tenant_repo.clone(),
            self.business_repo.clone(),
            self.review_repo.clone(),
            self.notification_prefs_repo.clone(),
            self.usage_repo.clone(),
            self.email_service.clone(),
            self.templates.clone(),
            self.config.app_url.clone(),
        )
    }

    pub fn digest_service(&self) -> DigestService {
        DigestService::new(
            self.notification_prefs_repo.clone(),
            self.tenant_repo.clone(),
            self.business_repo.clone(),
            self.review_repo.clone(),
            self.email_service.clone(),
            self.templates.clone(),
            self.config.app_url.clone(),
        )
    }
}

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;
use tera::Tera;

use crate::config::Config;
use crate::state::AppState;
use crate::domain::ports::{
    BrandSettingsRepository, BusinessRepository, CredentialRepository, JobRepository, LlmService,
    NotificationPreferencesRepository, ResponseRepository, ReviewRepository, SentimentClassifier,
    SubscriptionRepository, TenantRepository, UsageRepository,
};
use crate::domain::services::{digest_service::DIGEST_TEMPLATE, notification_service::NEW_REVIEW_TEMPLATE};
use crate::infra::ai::{llm_sentiment::LlmSentimentClassifier, openai_service::OpenAiService};
use crate::infra::email::http_email_service::HttpEmailService;
use crate::infra::google::{gbp_client::GbpClient, oauth_store::OAuthCredentialStore};
use crate::infra::notifications::job_queue_notifier::JobQueueNotifier;
use crate::infra::repositories::{
    postgres_brand_settings_repo::PostgresBrandSettingsRepo, postgres_business_repo::PostgresBusinessRepo,
    postgres_credential_repo::PostgresCredentialRepo, postgres_job_repo::PostgresJobRepo,
    postgres_notification_prefs_repo::PostgresNotificationPrefsRepo, postgres_response_repo::PostgresResponseRepo,
    postgres_review_repo::PostgresReviewRepo, postgres_subscription_repo::PostgresSubscriptionRepo,
    postgres_tenant_repo::PostgresTenantRepo, postgres_usage_repo::PostgresUsageRepo,
    sqlite_brand_settings_repo::SqliteBrandSettingsRepo, sqlite_business_repo::SqliteBusinessRepo,
    sqlite_credential_repo::SqliteCredentialRepo, sqlite_job_repo::SqliteJobRepo,
    sqlite_notification_prefs_repo::SqliteNotificationPrefsRepo, sqlite_response_repo::SqliteResponseRepo,
    sqlite_review_repo::SqliteReviewRepo, sqlite_subscription_repo::SqliteSubscriptionRepo,
    sqlite_tenant_repo::SqliteTenantRepo, sqlite_usage_repo::SqliteUsageRepo,
};

pub struct Repositories {
    pub tenant: Arc<dyn TenantRepository>,
    pub business: Arc<dyn BusinessRepository>,
    pub review: Arc<dyn ReviewRepository>,
    pub response: Arc<dyn ResponseRepository>,
    pub usage: Arc<dyn UsageRepository>,
    pub subscription: Arc<dyn SubscriptionRepository>,
    pub brand_settings: Arc<dyn BrandSettingsRepository>,
    pub notification_prefs: Arc<dyn NotificationPreferencesRepository>,
    pub credential: Arc<dyn CredentialRepository>,
    pub job: Arc<dyn JobRepository>,
}

impl Repositories {
    pub fn sqlite(pool: &SqlitePool) -> Self {
        Self {
            tenant: Arc::new(SqliteTenantRepo::new(pool.clone())),
            business: Arc::new(SqliteBusinessRepo::new(pool.clone())),
            review: Arc::new(SqliteReviewRepo::new(pool.clone())),
            response: Arc::new(SqliteResponseRepo::new(pool.clone())),
            usage: Arc::new(SqliteUsageRepo::new(pool.clone())),
            subscription: Arc::new(SqliteSubscriptionRepo::new(pool.clone())),
            brand_settings: Arc::new(SqliteBrandSettingsRepo::new(pool.clone())),
            notification_prefs: Arc::new(SqliteNotificationPrefsRepo::new(pool.clone())),
            credential: Arc::new(SqliteCredentialRepo::new(pool.clone())),
            job: Arc::new(SqliteJobRepo::new(pool.clone())),
        }
    }

    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            tenant: Arc::new(PostgresTenantRepo::new(pool.clone())),
            business: Arc::new(PostgresBusinessRepo::new(pool.clone())),
            review: Arc::new(PostgresReviewRepo::new(pool.clone())),
            response: Arc::new(PostgresResponseRepo::new(pool.clone())),
            usage: Arc::new(PostgresUsageRepo::new(pool.clone())),
            subscription: Arc::new(PostgresSubscriptionRepo::new(pool.clone())),
            brand_settings: Arc::new(PostgresBrandSettingsRepo::new(pool.clone())),
            notification_prefs: Arc::new(PostgresNotificationPrefsRepo::new(pool.clone())),
            credential: Arc::new(PostgresCredentialRepo::new(pool.clone())),
            job: Arc::new(PostgresJobRepo::new(pool.clone())),
        }
    }
}

pub fn load_templates() -> Tera {
    let mut tera = Tera::default();
    tera.add_raw_template(NEW_REVIEW_TEMPLATE, include_str!("../templates/new_review.html"))
        .expect("Failed to load new review template");
    tera.add_raw_template(DIGEST_TEMPLATE, include_str!("../templates/digest.html"))
        .expect("Failed to load digest template");
    tera
}

pub fn assemble_state(config: &Config, repos: Repositories) -> AppState {
    let credential_store = Arc::new(OAuthCredentialStore::new(
        repos.credential.clone(),
        config.google_token_url.clone(),
        config.google_client_id.clone(),
        config.google_client_secret.clone(),
    ));
    let review_source = Arc::new(GbpClient::new(
        config.gbp_api_base.clone(),
        credential_store,
        config.upstream_retry.clone(),
    ));

    let llm_service: Arc<dyn LlmService> = Arc::new(OpenAiService::new(
        config.openai_base_url.clone(),
        config.openai_api_key.clone(),
        config.openai_model.clone(),
    ));
    let sentiment_classifier = config.semantic_sentiment.then(|| {
        info!("Semantic sentiment classification enabled");
        Arc::new(LlmSentimentClassifier::new(llm_service.clone())) as Arc<dyn SentimentClassifier>
    });

    let email_service = Arc::new(HttpEmailService::new(
        config.mail_service_url.clone(),
        config.mail_service_token.clone(),
        config.mail_from.clone(),
    ));

    AppState {
        config: config.clone(),
        notifier: Arc::new(JobQueueNotifier::new(repos.job.clone())),
        tenant_repo: repos.tenant,
        business_repo: repos.business,
        review_repo: repos.review,
        response_repo: repos.response,
        usage_repo: repos.usage,
        subscription_repo: repos.subscription,
        brand_settings_repo: repos.brand_settings,
        notification_prefs_repo: repos.notification_prefs,
        credential_repo: repos.credential,
        job_repo: repos.job,
        review_source,
        llm_service,
        sentiment_classifier,
        email_service,
        templates: Arc::new(load_templates()),
    }
}

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;

    if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;
        assemble_state(config, Repositories::postgres(&pool))
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;
        assemble_state(config, Repositories::sqlite(&pool))
    }
}

async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

pub async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}

use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    // Total calls allowed for one request, including the first.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(1000),
            max_backoff: Duration::from_millis(30_000),
            max_attempts: 3,
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_public_key: String, // Ed25519 public key (PEM) of the identity provider
    pub auth_audience: String,
    pub cron_secret: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub google_client_id: String,
    pub google_client_secret: String,
    pub google_token_url: String,
    pub gbp_api_base: String,
    pub mail_service_url: String,
    pub mail_service_token: String,
    pub mail_from: String,
    pub app_url: String,
    pub sync_delay: Duration,
    pub upstream_retry: RetryPolicy,
    pub review_sync_interval: Option<Duration>,
    pub semantic_sentiment: bool,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn millis_or(key: &str, default: u64) -> Duration {
    Duration::from_millis(
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default),
    )
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: var_or("PORT", "3000").parse().expect("PORT must be a number"),
            jwt_public_key: env::var("JWT_PUBLIC_KEY").expect("JWT_PUBLIC_KEY must be set (Ed25519 Public Key)"),
            auth_audience: var_or("AUTH_AUDIENCE", "review-frontend"),
            cron_secret: env::var("CRON_SECRET").expect("CRON_SECRET must be set"),
            openai_api_key: var_or("OPENAI_API_KEY", ""),
            openai_base_url: var_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            openai_model: var_or("OPENAI_MODEL", "gpt-4o-mini"),
            google_client_id: var_or("GOOGLE_CLIENT_ID", ""),
            google_client_secret: var_or("GOOGLE_CLIENT_SECRET", ""),
            google_token_url: var_or("GOOGLE_TOKEN_URL", "https://oauth2.googleapis.com/token"),
            gbp_api_base: var_or("GBP_API_BASE", "https://mybusiness.googleapis.com/v4"),
            mail_service_url: var_or("MAIL_SERVICE_URL", "https://api.resend.com/emails"),
            mail_service_token: var_or("MAIL_SERVICE_TOKEN", ""),
            mail_from: var_or("MAIL_FROM", "AI Review Response <noreply@localhost>"),
            app_url: var_or("APP_URL", "http://localhost:3000"),
            sync_delay: millis_or("SYNC_DELAY_MS", 1000),
            upstream_retry: RetryPolicy {
                initial_backoff: millis_or("UPSTREAM_INITIAL_BACKOFF_MS", 1000),
                max_backoff: millis_or("UPSTREAM_MAX_BACKOFF_MS", 30_000),
                max_attempts: env::var("UPSTREAM_MAX_ATTEMPTS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(3),
            },
            review_sync_interval: env::var("REVIEW_SYNC_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs),
            semantic_sentiment: var_or("SEMANTIC_SENTIMENT", "false") == "true",
        }
    }
}

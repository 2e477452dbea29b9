pub mod sqlite_tenant_repo;
pub mod sqlite_business_repo;
pub mod sqlite_review_repo;
pub mod sqlite_response_repo;
pub mod sqlite_usage_repo;
pub mod sqlite_subscription_repo;
pub mod sqlite_brand_settings_repo;
pub mod sqlite_notification_prefs_repo;
pub mod sqlite_credential_repo;
pub mod sqlite_job_repo;

pub mod postgres_tenant_repo;
pub mod postgres_business_repo;
pub mod postgres_review_repo;
pub mod postgres_response_repo;
pub mod postgres_usage_repo;
pub mod postgres_subscription_repo;
pub mod postgres_brand_settings_repo;
pub mod postgres_notification_prefs_repo;
pub mod postgres_credential_repo;
pub mod postgres_job_repo;

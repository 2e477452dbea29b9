use crate::domain::{models::notification::NotificationPreferences, ports::NotificationPreferencesRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

pub struct PostgresNotificationPrefsRepo {
    pool: PgPool,
}

impl PostgresNotificationPrefsRepo {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

#[async_trait]
impl NotificationPreferencesRepository for PostgresNotificationPrefsRepo {
    async fn find_by_tenant(&self, tenant_id: &str) -> Result<Option<NotificationPreferences>, AppError> {
        sqlx::query_as::<_, NotificationPreferences>("SELECT * FROM notification_preferences WHERE tenant_id = $1")
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn upsert(&self, prefs: &NotificationPreferences) -> Result<NotificationPreferences, AppError> {
        sqlx::query_as::<_, NotificationPreferences>(
            "INSERT INTO notification_preferences (tenant_id, email, email_enabled, email_for_new_reviews, email_for_negative_reviews, email_digest, digest_send_day, last_digest_sent, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT (tenant_id) DO UPDATE SET
                email = excluded.email,
                email_enabled = excluded.email_enabled,
                email_for_new_reviews = excluded.email_for_new_reviews,
                email_for_negative_reviews = excluded.email_for_negative_reviews,
                email_digest = excluded.email_digest,
                digest_send_day = excluded.digest_send_day,
                updated_at = excluded.updated_at
             RETURNING *"
        )
            .bind(&prefs.tenant_id)
            .bind(&prefs.email)
            .bind(prefs.email_enabled)
            .bind(prefs.email_for_new_reviews)
            .bind(prefs.email_for_negative_reviews)
            .bind(prefs.email_digest.as_str())
            .bind(prefs.digest_send_day)
            .bind(prefs.last_digest_sent)
            .bind(prefs.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_digest_subscribers(&self) -> Result<Vec<NotificationPreferences>, AppError> {
        sqlx::query_as::<_, NotificationPreferences>(
            "SELECT * FROM notification_preferences WHERE email_enabled = TRUE AND email_digest IN ('daily', 'weekly') ORDER BY tenant_id"
        )
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn mark_digest_sent(&self, tenant_id: &str, at: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query("UPDATE notification_preferences SET last_digest_sent = $1 WHERE tenant_id = $2")
            .bind(at)
            .bind(tenant_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }
}

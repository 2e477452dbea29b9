use crate::domain::{models::brand::BrandSettings, ports::BrandSettingsRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteBrandSettingsRepo {
    pool: SqlitePool,
}

impl SqliteBrandSettingsRepo {
    pub fn new(pool: SqlitePool) -> Self { Self { pool } }
}

#[async_trait]
impl BrandSettingsRepository for SqliteBrandSettingsRepo {
    async fn find_by_business(&self, business_id: &str) -> Result<Option<BrandSettings>, AppError> {
        sqlx::query_as::<_, BrandSettings>("SELECT * FROM brand_settings WHERE business_id = ?")
            .bind(business_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn upsert(&self, settings: &BrandSettings) -> Result<BrandSettings, AppError> {
        sqlx::query_as::<_, BrandSettings>(
            "INSERT INTO brand_settings (business_id, tone, greeting, closing, response_length, include_coupon, coupon_code, auto_publish, notify_on_negative, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(business_id) DO UPDATE SET
                tone = excluded.tone,
                greeting = excluded.greeting,
                closing = excluded.closing,
                response_length = excluded.response_length,
                include_coupon = excluded.include_coupon,
                coupon_code = excluded.coupon_code,
                auto_publish = excluded.auto_publish,
                notify_on_negative = excluded.notify_on_negative,
                updated_at = excluded.updated_at
             RETURNING *"
        )
            .bind(&settings.business_id)
            .bind(&settings.tone)
            .bind(&settings.greeting)
            .bind(&settings.closing)
            .bind(&settings.response_length)
            .bind(settings.include_coupon)
            .bind(&settings.coupon_code)
            .bind(settings.auto_publish)
            .bind(settings.notify_on_negative)
            .bind(settings.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}

use crate::domain::{models::business::Business, ports::BusinessRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

pub struct PostgresBusinessRepo {
    pool: PgPool,
}

impl PostgresBusinessRepo {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

#[async_trait]
impl BusinessRepository for PostgresBusinessRepo {
    async fn create(&self, business: &Business) -> Result<Business, AppError> {
        sqlx::query_as::<_, Business>(
            r#"
            INSERT INTO businesses (id, tenant_id, name, gmb_account_id, gmb_location_id, gmb_location_name, is_active, responses_published, last_synced_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#
        )
            .bind(&business.id)
            .bind(&business.tenant_id)
            .bind(&business.name)
            .bind(&business.gmb_account_id)
            .bind(&business.gmb_location_id)
            .bind(&business.gmb_location_name)
            .bind(business.is_active)
            .bind(business.responses_published)
            .bind(business.last_synced_at)
            .bind(business.created_at)
            .bind(business.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, tenant_id: &str, id: &str) -> Result<Option<Business>, AppError> {
        sqlx::query_as::<_, Business>("SELECT * FROM businesses WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_tenant(&self, tenant_id: &str) -> Result<Vec<Business>, AppError> {
        sqlx::query_as::<_, Business>("SELECT * FROM businesses WHERE tenant_id = $1 ORDER BY created_at ASC")
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_syncable(&self) -> Result<Vec<Business>, AppError> {
        sqlx::query_as::<_, Business>(
            r#"
            SELECT * FROM businesses
            WHERE is_active = TRUE
            AND COALESCE(gmb_account_id, '') <> ''
            AND COALESCE(gmb_location_id, '') <> ''
            ORDER BY created_at ASC
            "#
        )
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn count_active_by_tenant(&self, tenant_id: &str) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM businesses WHERE tenant_id = $1 AND is_active = TRUE")
            .bind(tenant_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(count)
    }

    async fn update_connection(&self, business: &Business) -> Result<Business, AppError> {
        sqlx::query_as::<_, Business>(
            r#"
            UPDATE businesses SET name = $1, gmb_account_id = $2, gmb_location_id = $3, gmb_location_name = $4, updated_at = $5
            WHERE id = $6 AND tenant_id = $7
            RETURNING *
            "#
        )
            .bind(&business.name)
            .bind(&business.gmb_account_id)
            .bind(&business.gmb_location_id)
            .bind(&business.gmb_location_name)
            .bind(business.updated_at)
            .bind(&business.id)
            .bind(&business.tenant_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound(format!("Business {} not found", business.id)))
    }

    async fn deactivate(&self, tenant_id: &str, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE businesses SET is_active = FALSE, updated_at = $1 WHERE id = $2 AND tenant_id = $3")
            .bind(Utc::now())
            .bind(id)
            .bind(tenant_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Business {} not found", id)));
        }
        Ok(())
    }

    async fn mark_synced(&self, id: &str, at: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query("UPDATE businesses SET last_synced_at = $1, updated_at = $1 WHERE id = $2")
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }
}

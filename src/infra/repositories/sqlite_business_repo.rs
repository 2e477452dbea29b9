use crate::domain::{models::business::Business, ports::BusinessRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

pub struct SqliteBusinessRepo {
    pool: SqlitePool,
}

impl SqliteBusinessRepo {
    pub fn new(pool: SqlitePool) -> Self { Self { pool } }
}

#[async_trait]
impl BusinessRepository for SqliteBusinessRepo {
    async fn create(&self, business: &Business) -> Result<Business, AppError> {
        sqlx::query_as::<_, Business>(
            "INSERT INTO businesses (id, tenant_id, name, gmb_account_id, gmb_location_id, gmb_location_name, is_active, responses_published, last_synced_at, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
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
        sqlx::query_as::<_, Business>("SELECT * FROM businesses WHERE id = ? AND tenant_id = ?")
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_tenant(&self, tenant_id: &str) -> Result<Vec<Business>, AppError> {
        sqlx::query_as::<_, Business>("SELECT * FROM businesses WHERE tenant_id = ? ORDER BY created_at ASC")
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_syncable(&self) -> Result<Vec<Business>, AppError> {
        sqlx::query_as::<_, Business>(
            "SELECT * FROM businesses
             WHERE is_active = 1
             AND gmb_account_id IS NOT NULL AND gmb_account_id <> ''
             AND gmb_location_id IS NOT NULL AND gmb_location_id <> ''
             ORDER BY created_at ASC"
        )
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn count_active_by_tenant(&self, tenant_id: &str) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM businesses WHERE tenant_id = ? AND is_active = 1")
            .bind(tenant_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(count)
    }

    async fn update_connection(&self, business: &Business) -> Result<Business, AppError> {
        sqlx::query_as::<_, Business>(
            "UPDATE businesses SET name = ?, gmb_account_id = ?, gmb_location_id = ?, gmb_location_name = ?, updated_at = ?
             WHERE id = ? AND tenant_id = ?
             RETURNING *"
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
        let result = sqlx::query("UPDATE businesses SET is_active = 0, updated_at = ? WHERE id = ? AND tenant_id = ?")
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
        sqlx::query("UPDATE businesses SET last_synced_at = ?, updated_at = ? WHERE id = ?")
            .bind(at)
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }
}

use crate::domain::{models::usage::{UsageAction, UsageLedgerEntry}, ports::UsageRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

pub struct SqliteUsageRepo {
    pool: SqlitePool,
}

impl SqliteUsageRepo {
    pub fn new(pool: SqlitePool) -> Self { Self { pool } }
}

#[async_trait]
impl UsageRepository for SqliteUsageRepo {
    async fn record(&self, entry: &UsageLedgerEntry) -> Result<(), AppError> {
        sqlx::query("INSERT INTO usage_ledger (id, tenant_id, business_id, action, tokens_used, cost_cents, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)")
            .bind(&entry.id)
            .bind(&entry.tenant_id)
            .bind(&entry.business_id)
            .bind(entry.action.as_str())
            .bind(entry.tokens_used)
            .bind(entry.cost_cents)
            .bind(entry.created_at)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn count_since(&self, tenant_id: &str, action: UsageAction, since: Option<DateTime<Utc>>) -> Result<i64, AppError> {
        let count: i64 = match since {
            Some(since) => sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM usage_ledger WHERE tenant_id = ? AND action = ? AND created_at >= ?")
                .bind(tenant_id)
                .bind(action.as_str())
                .bind(since)
                .fetch_one(&self.pool)
                .await,
            None => sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM usage_ledger WHERE tenant_id = ? AND action = ?")
                .bind(tenant_id)
                .bind(action.as_str())
                .fetch_one(&self.pool)
                .await,
        }
            .map_err(AppError::Database)?;
        Ok(count)
    }
}

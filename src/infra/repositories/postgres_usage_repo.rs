use crate::domain::{models::usage::{UsageAction, UsageLedgerEntry}, ports::UsageRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

pub struct PostgresUsageRepo {
    pool: PgPool,
}

impl PostgresUsageRepo {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

#[async_trait]
impl UsageRepository for PostgresUsageRepo {
    async fn record(&self, entry: &UsageLedgerEntry) -> Result<(), AppError> {
        sqlx::query("INSERT INTO usage_ledger (id, tenant_id, business_id, action, tokens_used, cost_cents, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)")
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
            Some(since) => sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM usage_ledger WHERE tenant_id = $1 AND action = $2 AND created_at >= $3")
                .bind(tenant_id)
                .bind(action.as_str())
                .bind(since)
                .fetch_one(&self.pool)
                .await,
            None => sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM usage_ledger WHERE tenant_id = $1 AND action = $2")
                .bind(tenant_id)
                .bind(action.as_str())
                .fetch_one(&self.pool)
                .await,
        }
            .map_err(AppError::Database)?;
        Ok(count)
    }
}

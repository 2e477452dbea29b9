use crate::domain::{
    models::{response::Response, review::PostedReply, usage::UsageLedgerEntry},
    ports::ResponseRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

pub struct SqliteResponseRepo {
    pool: SqlitePool,
}

impl SqliteResponseRepo {
    pub fn new(pool: SqlitePool) -> Self { Self { pool } }
}

#[async_trait]
impl ResponseRepository for SqliteResponseRepo {
    async fn create_with_usage(&self, response: &Response, usage: &UsageLedgerEntry) -> Result<Response, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let created = sqlx::query_as::<_, Response>(
            "INSERT INTO responses (id, review_id, business_id, content, tone, status, ai_model, ai_tokens_used, edit_history, approved_by, approved_at, published_at, external_reply_id, rejection_reason, version, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&response.id).bind(&response.review_id).bind(&response.business_id)
            .bind(&response.content).bind(&response.tone).bind(response.status.as_str())
            .bind(&response.ai_model).bind(response.ai_tokens_used).bind(&response.edit_history)
            .bind(&response.approved_by).bind(response.approved_at).bind(response.published_at)
            .bind(&response.external_reply_id).bind(&response.rejection_reason).bind(response.version)
            .bind(response.created_at).bind(response.updated_at)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        sqlx::query("INSERT INTO usage_ledger (id, tenant_id, business_id, action, tokens_used, cost_cents, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)")
            .bind(&usage.id).bind(&usage.tenant_id).bind(&usage.business_id).bind(usage.action.as_str())
            .bind(usage.tokens_used).bind(usage.cost_cents).bind(usage.created_at)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Response>, AppError> {
        sqlx::query_as::<_, Response>("SELECT * FROM responses WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_in_flight(&self, review_id: &str) -> Result<Option<Response>, AppError> {
        sqlx::query_as::<_, Response>("SELECT * FROM responses WHERE review_id = ? AND status <> 'published'")
            .bind(review_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_review(&self, review_id: &str) -> Result<Vec<Response>, AppError> {
        sqlx::query_as::<_, Response>("SELECT * FROM responses WHERE review_id = ? ORDER BY created_at ASC")
            .bind(review_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update_draft(&self, response: &Response, expected_version: i32) -> Result<Option<Response>, AppError> {
        sqlx::query_as::<_, Response>(
            "UPDATE responses SET content = ?, status = ?, edit_history = ?, approved_by = ?, approved_at = ?, rejection_reason = ?, version = version + 1, updated_at = ?
             WHERE id = ? AND version = ? AND status <> 'published'
             RETURNING *"
        )
            .bind(&response.content)
            .bind(response.status.as_str())
            .bind(&response.edit_history)
            .bind(&response.approved_by)
            .bind(response.approved_at)
            .bind(&response.rejection_reason)
            .bind(response.updated_at)
            .bind(&response.id)
            .bind(expected_version)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn record_external_reply(&self, id: &str, reply: &PostedReply) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE responses SET external_reply_id = ?, published_at = ?, version = version + 1, updated_at = ?
             WHERE id = ? AND status = 'approved' AND external_reply_id IS NULL"
        )
            .bind(&reply.external_reply_id)
            .bind(reply.published_at)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(format!(
                "Response {} changed while its reply was being posted",
                id
            )));
        }
        Ok(())
    }

    async fn commit_publish(&self, response: &Response) -> Result<Response, AppError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let published = sqlx::query_as::<_, Response>(
            "UPDATE responses SET status = 'published', published_at = COALESCE(published_at, ?), external_reply_id = COALESCE(external_reply_id, ?), version = version + 1, updated_at = ?
             WHERE id = ? AND status = 'approved'
             RETURNING *"
        )
            .bind(response.published_at.unwrap_or(now))
            .bind(&response.external_reply_id)
            .bind(now)
            .bind(&response.id)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?
            .ok_or_else(|| AppError::Conflict(format!("Response {} is no longer approved", response.id)))?;

        sqlx::query("UPDATE reviews SET is_responded = 1, updated_at = ? WHERE id = ?")
            .bind(now).bind(&published.review_id)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        sqlx::query("UPDATE businesses SET responses_published = responses_published + 1, updated_at = ? WHERE id = ?")
            .bind(now).bind(&published.business_id)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(published)
    }
}

use crate::domain::{models::subscription::{Subscription, ENTITLED_STATUSES}, ports::SubscriptionRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteSubscriptionRepo {
    pool: SqlitePool,
}

impl SqliteSubscriptionRepo {
    pub fn new(pool: SqlitePool) -> Self { Self { pool } }
}

#[async_trait]
impl SubscriptionRepository for SqliteSubscriptionRepo {
    async fn create(&self, subscription: &Subscription) -> Result<Subscription, AppError> {
        sqlx::query_as::<_, Subscription>(
            "INSERT INTO subscriptions (id, tenant_id, status, plan_type, current_period_start, current_period_end, created_at) VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING *"
        )
            .bind(&subscription.id)
            .bind(&subscription.tenant_id)
            .bind(&subscription.status)
            .bind(&subscription.plan_type)
            .bind(subscription.current_period_start)
            .bind(subscription.current_period_end)
            .bind(subscription.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_active(&self, tenant_id: &str) -> Result<Option<Subscription>, AppError> {
        sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions WHERE tenant_id = ? AND status IN (?, ?) ORDER BY created_at DESC LIMIT 1"
        )
            .bind(tenant_id)
            .bind(ENTITLED_STATUSES[0])
            .bind(ENTITLED_STATUSES[1])
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}

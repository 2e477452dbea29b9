use crate::domain::{models::subscription::{Subscription, ENTITLED_STATUSES}, ports::SubscriptionRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresSubscriptionRepo {
    pool: PgPool,
}

impl PostgresSubscriptionRepo {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepo {
    async fn create(&self, subscription: &Subscription) -> Result<Subscription, AppError> {
        sqlx::query_as::<_, Subscription>(
            "INSERT INTO subscriptions (id, tenant_id, status, plan_type, current_period_start, current_period_end, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *"
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
            "SELECT * FROM subscriptions WHERE tenant_id = $1 AND status IN ($2, $3) ORDER BY created_at DESC LIMIT 1"
        )
            .bind(tenant_id)
            .bind(ENTITLED_STATUSES[0])
            .bind(ENTITLED_STATUSES[1])
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}

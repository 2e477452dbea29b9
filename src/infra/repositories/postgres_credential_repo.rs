use crate::domain::{models::credential::ExternalCredential, ports::CredentialRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresCredentialRepo {
    pool: PgPool,
}

impl PostgresCredentialRepo {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

#[async_trait]
impl CredentialRepository for PostgresCredentialRepo {
    async fn find_active(&self, tenant_id: &str, provider: &str) -> Result<Option<ExternalCredential>, AppError> {
        sqlx::query_as::<_, ExternalCredential>(
            "SELECT * FROM external_credentials WHERE tenant_id = $1 AND provider = $2 AND is_active = TRUE"
        )
            .bind(tenant_id)
            .bind(provider)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn upsert(&self, credential: &ExternalCredential) -> Result<ExternalCredential, AppError> {
        sqlx::query_as::<_, ExternalCredential>(
            "INSERT INTO external_credentials (tenant_id, provider, access_token, refresh_token, expires_at, is_active, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (tenant_id, provider) DO UPDATE SET
                access_token = excluded.access_token,
                refresh_token = excluded.refresh_token,
                expires_at = excluded.expires_at,
                is_active = excluded.is_active,
                updated_at = excluded.updated_at
             RETURNING *"
        )
            .bind(&credential.tenant_id)
            .bind(&credential.provider)
            .bind(&credential.access_token)
            .bind(&credential.refresh_token)
            .bind(credential.expires_at)
            .bind(credential.is_active)
            .bind(credential.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}

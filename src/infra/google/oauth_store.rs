use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};
use crate::domain::{
    models::credential::{ExternalCredential, GOOGLE_PROVIDER},
    ports::{CredentialRepository, CredentialStore},
};
use crate::error::AppError;

const EXPIRY_SKEW_SECS: i64 = 60;

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
}

pub struct OAuthCredentialStore {
    client: Client,
    credentials: Arc<dyn CredentialRepository>,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl OAuthCredentialStore {
    pub fn new(credentials: Arc<dyn CredentialRepository>, token_url: String, client_id: String, client_secret: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .unwrap_or_else(|_| Client::new()),
            credentials,
            token_url,
            client_id,
            client_secret,
        }
    }

    async fn refresh(&self, credential: &ExternalCredential, refresh_token: &str) -> Result<ExternalCredential, AppError> {
        let res = self.client.post(&self.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                warn!("Token refresh request failed: {}", e);
                AppError::NotConnected
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            warn!("Token refresh rejected. Status: {}, Body: {}", status, text);
            return Err(AppError::NotConnected);
        }

        let token: TokenResponse = res.json().await.map_err(|e| {
            warn!("Token refresh returned an unreadable body: {}", e);
            AppError::NotConnected
        })?;

        let refreshed = ExternalCredential {
            access_token: token.access_token,
            refresh_token: token.refresh_token.or_else(|| credential.refresh_token.clone()),
            expires_at: token.expires_in.map(|secs| Utc::now() + chrono::Duration::seconds(secs)),
            updated_at: Utc::now(),
            ..credential.clone()
        };
        self.credentials.upsert(&refreshed).await
    }
}

#[async_trait]
impl CredentialStore for OAuthCredentialStore {
    async fn access_token(&self, tenant_id: &str) -> Result<String, AppError> {
        let credential = self.credentials.find_active(tenant_id, GOOGLE_PROVIDER).await?
            .ok_or(AppError::NotConnected)?;

        if !credential.expires_within(Utc::now(), chrono::Duration::seconds(EXPIRY_SKEW_SECS)) {
            return Ok(credential.access_token);
        }

        let Some(refresh_token) = credential.refresh_token.clone() else {
            warn!("Access token for tenant {} expired and no refresh token is stored", tenant_id);
            return Err(AppError::NotConnected);
        };

        let refreshed = self.refresh(&credential, &refresh_token).await?;
        info!("Refreshed Google access token for tenant {}", tenant_id);
        Ok(refreshed.access_token)
    }
}

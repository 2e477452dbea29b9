use crate::domain::ports::EmailService;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info};

pub struct HttpEmailService {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl HttpEmailService {
    pub fn new(api_url: String, api_key: String, from: String) -> Self {
        Self {
            client: Client::new(),
            api_url,
            api_key,
            from,
        }
    }
}

#[derive(Serialize)]
struct EmailPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

#[async_trait]
impl EmailService for HttpEmailService {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<(), AppError> {
        if self.api_key.is_empty() {
            info!("Email service not configured; dropping '{}' to {}", subject, recipient);
            return Ok(());
        }

        let payload = EmailPayload {
            from: &self.from,
            to: recipient,
            subject,
            html: html_body,
        };

        let res = self.client.post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Email service connection error: {}", e);
                error!("{}", msg);
                AppError::InternalWithMsg(msg)
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            let msg = format!("Email service failed. Status: {}, Body: {}", status, text);
            error!("{}", msg);
            return Err(AppError::InternalWithMsg(msg));
        }

        Ok(())
    }
}

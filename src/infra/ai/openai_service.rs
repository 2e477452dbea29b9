use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{error, info, instrument};
use crate::domain::{
    models::ai::{Completion, CompletionRequest},
    ports::LlmService,
};
use crate::error::AppError;

pub struct OpenAiService {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiService {
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }

    fn extract_completion(&self, body: Value) -> Result<Completion, AppError> {
        let content = body.get("choices")
            .and_then(|c| c.as_array())
            .and_then(|choices| choices.first())
            .and_then(|first| first.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str());

        let Some(content) = content else {
            error!("Invalid or unexpected response structure from LLM: {:?}", body);
            return Err(AppError::GenerationFailed("response missing content".into()));
        };

        let tokens_used = body.get("usage")
            .and_then(|u| u.get("total_tokens"))
            .and_then(|t| t.as_i64())
            .unwrap_or(0) as i32;
        let model = body.get("model")
            .and_then(|m| m.as_str())
            .unwrap_or(&self.model)
            .to_string();

        Ok(Completion { content: content.trim().to_string(), tokens_used, model })
    }
}

#[async_trait]
impl LlmService for OpenAiService {
    #[instrument(skip(self, request), fields(prompt_len = request.prompt.len()))]
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, AppError> {
        let payload = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.prompt }
            ],
            "max_tokens": request.max_tokens,
            "temperature": request.temperature
        });

        info!("Sending completion request to LLM...");
        let response = self.client.post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!("LLM network error: {:?}", e);
                AppError::GenerationFailed(format!("network error: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!("LLM provider error {}: {}", status, text);
            return Err(AppError::GenerationFailed(format!("provider error: {} - {}", status, text)));
        }

        let body: Value = response.json().await.map_err(|e| {
            error!("Failed to parse LLM response JSON: {:?}", e);
            AppError::GenerationFailed("invalid JSON body".into())
        })?;

        let completion = self.extract_completion(body)?;
        info!("Completion received ({} tokens).", completion.tokens_used);
        Ok(completion)
    }
}

use std::sync::Arc;
use async_trait::async_trait;
use crate::domain::{
    models::{ai::CompletionRequest, review::Sentiment},
    ports::{LlmService, SentimentClassifier},
};
use crate::error::AppError;

const INSTRUCTION: &str = "Analyze the sentiment of this review. Respond with only one word: positive, neutral, or negative.";

pub struct LlmSentimentClassifier {
    llm: Arc<dyn LlmService>,
}

impl LlmSentimentClassifier {
    pub fn new(llm: Arc<dyn LlmService>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl SentimentClassifier for LlmSentimentClassifier {
    async fn classify(&self, text: &str) -> Result<Sentiment, AppError> {
        let completion = self.llm.complete(&CompletionRequest {
            system: INSTRUCTION.to_string(),
            prompt: text.to_string(),
            max_tokens: 10,
            temperature: 0.0,
        }).await?;

        Ok(Sentiment::from_label(&completion.content))
    }
}

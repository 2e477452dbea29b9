pub mod llm_sentiment;
pub mod openai_service;

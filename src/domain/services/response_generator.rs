use std::sync::Arc;
use tracing::{error, info, instrument};
use crate::domain::{
    models::{
        ai::CompletionRequest,
        brand::BrandSettings,
        business::Business,
        response::Response,
        review::Review,
        usage::{UsageAction, UsageLedgerEntry},
    },
    ports::{LlmService, ResponseRepository},
};
use crate::error::AppError;

const SYSTEM_PROMPT: &str = "You are a professional business owner responding to customer reviews.";
const TEMPERATURE: f32 = 0.7;

pub struct ResponseGenerator {
    responses: Arc<dyn ResponseRepository>,
    llm: Arc<dyn LlmService>,
}

impl ResponseGenerator {
    pub fn new(responses: Arc<dyn ResponseRepository>, llm: Arc<dyn LlmService>) -> Self {
        Self { responses, llm }
    }

    #[instrument(skip_all, fields(review_id = %review.id, business_id = %business.id))]
    pub async fn generate(&self, review: &Review, business: &Business, settings: &BrandSettings) -> Result<Response, AppError> {
        if let Some(existing) = self.responses.find_in_flight(&review.id).await? {
            return Err(AppError::Conflict(format!(
                "Review already has a {} response ({}); edit it instead",
                existing.status.as_str(),
                existing.id
            )));
        }

        let request = build_prompt(review, business, settings);
        let completion = self.llm.complete(&request).await.map_err(|e| match e {
            AppError::GenerationFailed(_) => e,
            other => AppError::GenerationFailed(other.to_string()),
        })?;

        let content = completion.content.trim().to_string();
        if content.is_empty() {
            error!("LLM returned an empty completion for review {}", review.id);
            return Err(AppError::GenerationFailed("empty completion".into()));
        }

        let response = Response::generated(
            review,
            content,
            settings.tone().as_str().to_string(),
            completion.model,
            completion.tokens_used,
        );
        let usage = UsageLedgerEntry::new(
            business.tenant_id.clone(),
            Some(business.id.clone()),
            UsageAction::AiResponse,
            completion.tokens_used,
            estimate_cost_cents(completion.tokens_used),
        );

        let created = self.responses.create_with_usage(&response, &usage).await.map_err(|e| {
            if e.is_unique_violation() {
                AppError::Conflict("Another response for this review was created concurrently".into())
            } else {
                e
            }
        })?;

        info!("Generated response {} ({} tokens)", created.id, created.ai_tokens_used);
        Ok(created)
    }
}

pub fn build_prompt(review: &Review, business: &Business, settings: &BrandSettings) -> CompletionRequest {
    let tone = settings.tone();
    let length = settings.length();

    let mut prompt = format!(
        "You are a business called \"{}\" responding to a customer review.\n\n",
        business.name
    );
    if let Some(greeting) = settings.greeting.as_deref().filter(|g| !g.trim().is_empty()) {
        prompt.push_str(&format!("Use this greeting: \"{}\"\n\n", greeting));
    }
    prompt.push_str(&format!("Review: \"{}\"\nRating: {}/5 stars\n\n", review.review_text, review.star_rating));
    prompt.push_str(tone.instructions());
    prompt.push_str("\n\nGuidelines:\n1. Thank the customer for their feedback\n2. Address specific points they mentioned\n");

    if review.star_rating <= 2 {
        prompt.push_str("3. Acknowledge their concerns, apologize and offer to make things right\n");
    } else if review.star_rating >= 4 {
        prompt.push_str("3. Express gratitude and encourage them to come back\n");
    } else {
        prompt.push_str("3. Thank them for the balanced feedback and mention how you will improve\n");
    }

    match settings.closing.as_deref().filter(|c| !c.trim().is_empty()) {
        Some(closing) => prompt.push_str(&format!("4. End with: \"{}\"\n", closing)),
        None => prompt.push_str("4. End with a friendly closing\n"),
    }
    prompt.push_str(&format!("5. Keep the response under {} words\n", length.word_budget()));
    prompt.push_str("6. Never mention the rating number in your response\n");

    if settings.include_coupon
        && let Some(code) = settings.coupon_code.as_deref().filter(|c| !c.trim().is_empty())
    {
        prompt.push_str(&format!("7. Invite them back with the coupon code {}\n", code));
    }

    CompletionRequest {
        system: SYSTEM_PROMPT.to_string(),
        prompt,
        max_tokens: length.word_budget() * 2,
        temperature: TEMPERATURE,
    }
}

// Cents for a completion, assuming a 30/70 input/output split at $0.15 / $0.60 per 1K tokens.
pub fn estimate_cost_cents(tokens_used: i32) -> i32 {
    let tokens = i64::from(tokens_used.max(0));
    let output = tokens * 7 / 10;
    let input = tokens - output;
    ((input * 15 + output * 60 + 500) / 1000) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{brand::BrandSettings, review::ExternalReview};

    fn review(rating: i32, text: &str) -> Review {
        Review::from_external("b1", &ExternalReview {
            external_review_id: "ext-1".into(),
            author_name: "Sam".into(),
            author_photo_url: None,
            star_rating: rating,
            text: text.into(),
            created_at: None,
            updated_at: None,
        })
    }

    #[test]
    fn test_estimate_cost_cents() {
        assert_eq!(estimate_cost_cents(0), 0);
        assert_eq!(estimate_cost_cents(300), 14);
        assert_eq!(estimate_cost_cents(1000), 47);
        assert_eq!(estimate_cost_cents(-5), 0);
    }

    #[test]
    fn test_prompt_for_negative_review() {
        let business = Business::new("t1".into(), "Blue Door Bistro".into());
        let mut settings = BrandSettings::defaults_for(&business.id);
        settings.tone = "friendly".into();
        settings.closing = Some("See you soon, the Blue Door team".into());

        let request = build_prompt(&review(1, "Cold soup and slow service"), &business, &settings);

        assert!(request.prompt.contains("\"Blue Door Bistro\""));
        assert!(request.prompt.contains("Cold soup and slow service"));
        assert!(request.prompt.contains("warm, friendly tone"));
        assert!(request.prompt.contains("apologize"));
        assert!(request.prompt.contains("End with: \"See you soon, the Blue Door team\""));
        assert!(request.prompt.contains("under 150 words"));
        assert!(request.prompt.contains("Never mention the rating number"));
    }

    #[test]
    fn test_prompt_unknown_tone_and_coupon() {
        let business = Business::new("t1".into(), "Cafe".into());
        let mut settings = BrandSettings::defaults_for(&business.id);
        settings.tone = "sarcastic".into();
        settings.response_length = "short".into();
        settings.include_coupon = true;
        settings.coupon_code = Some("THANKS10".into());

        let request = build_prompt(&review(5, "Great coffee"), &business, &settings);

        assert!(request.prompt.contains("professional, formal tone"));
        assert!(request.prompt.contains("encourage them to come back"));
        assert!(request.prompt.contains("under 75 words"));
        assert!(request.prompt.contains("THANKS10"));
        assert_eq!(request.max_tokens, 150);
    }
}

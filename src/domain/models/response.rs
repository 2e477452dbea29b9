use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use super::{review::Review, UnknownVariant};
use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Generated,
    Approved,
    Published,
}

impl ResponseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStatus::Generated => "generated",
            ResponseStatus::Approved => "approved",
            ResponseStatus::Published => "published",
        }
    }
}

impl TryFrom<String> for ResponseStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "generated" => Ok(ResponseStatus::Generated),
            "approved" => Ok(ResponseStatus::Approved),
            "published" => Ok(ResponseStatus::Published),
            _ => Err(UnknownVariant { kind: "response status", value }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EditEntry {
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Response {
    pub id: String,
    pub review_id: String,
    pub business_id: String,
    pub content: String,
    pub tone: String,
    #[sqlx(try_from = "String")]
    pub status: ResponseStatus,
    pub ai_model: Option<String>,
    pub ai_tokens_used: i32,
    pub edit_history: Json<Vec<EditEntry>>,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub external_reply_id: Option<String>,
    pub rejection_reason: Option<String>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Response {
    pub fn generated(review: &Review, content: String, tone: String, ai_model: String, tokens_used: i32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            review_id: review.id.clone(),
            business_id: review.business_id.clone(),
            edit_history: Json(vec![EditEntry { content: content.clone(), timestamp: now }]),
            content,
            tone,
            status: ResponseStatus::Generated,
            ai_model: Some(ai_model),
            ai_tokens_used: tokens_used,
            approved_by: None,
            approved_at: None,
            published_at: None,
            external_reply_id: None,
            rejection_reason: None,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn approve(&mut self, approver_id: &str) -> Result<(), AppError> {
        if self.status != ResponseStatus::Generated {
            return Err(AppError::InvalidTransition(format!(
                "Only generated responses can be approved (current status: {})",
                self.status.as_str()
            )));
        }
        let now = Utc::now();
        self.status = ResponseStatus::Approved;
        self.approved_by = Some(approver_id.to_string());
        self.approved_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    pub fn edit(&mut self, content: String) -> Result<(), AppError> {
        if self.status == ResponseStatus::Published {
            return Err(AppError::InvalidTransition("Published responses can no longer be edited".into()));
        }
        if self.external_reply_id.is_some() {
            return Err(AppError::InvalidTransition(
                "This reply was already posted upstream; publish it to finish before editing".into(),
            ));
        }
        let now = Utc::now();
        self.edit_history.0.push(EditEntry { content: content.clone(), timestamp: now });
        self.content = content;
        self.status = ResponseStatus::Generated;
        self.approved_by = None;
        self.approved_at = None;
        self.updated_at = now;
        Ok(())
    }

    // Rejection is a note on the draft, not a lifecycle state.
    pub fn annotate_rejection(&mut self, reason: String) -> Result<(), AppError> {
        if self.status == ResponseStatus::Published {
            return Err(AppError::InvalidTransition("Published responses cannot be rejected".into()));
        }
        self.rejection_reason = Some(reason);
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn ensure_publishable(&self) -> Result<(), AppError> {
        if self.status != ResponseStatus::Approved {
            return Err(AppError::InvalidTransition(format!(
                "Only approved responses can be published (current status: {})",
                self.status.as_str()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::review::ExternalReview;

    fn draft() -> Response {
        let review = Review::from_external("b1", &ExternalReview {
            external_review_id: "ext-1".into(),
            author_name: "Ana".into(),
            author_photo_url: None,
            star_rating: 5,
            text: "Lovely".into(),
            created_at: None,
            updated_at: None,
        });
        Response::generated(&review, "Thanks Ana!".into(), "friendly".into(), "gpt-4o-mini".into(), 120)
    }

    #[test]
    fn test_generated_seeds_history() {
        let response = draft();
        assert_eq!(response.status, ResponseStatus::Generated);
        assert_eq!(response.edit_history.0.len(), 1);
        assert_eq!(response.edit_history.0[0].content, "Thanks Ana!");
    }

    #[test]
    fn test_approve_only_from_generated() {
        let mut response = draft();
        response.approve("u1").unwrap();
        assert_eq!(response.status, ResponseStatus::Approved);
        assert_eq!(response.approved_by.as_deref(), Some("u1"));

        let err = response.approve("u1").unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
    }

    #[test]
    fn test_edit_resets_approval_and_appends_history() {
        let mut response = draft();
        response.approve("u1").unwrap();
        response.edit("Thank you so much, Ana!".into()).unwrap();

        assert_eq!(response.status, ResponseStatus::Generated);
        assert!(response.approved_by.is_none());
        let history: Vec<&str> = response.edit_history.0.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(history, vec!["Thanks Ana!", "Thank you so much, Ana!"]);
    }

    #[test]
    fn test_published_is_terminal() {
        let mut response = draft();
        response.status = ResponseStatus::Published;
        assert!(matches!(response.edit("x".into()), Err(AppError::InvalidTransition(_))));
        assert!(matches!(response.approve("u1"), Err(AppError::InvalidTransition(_))));
        assert!(matches!(response.ensure_publishable(), Err(AppError::InvalidTransition(_))));
    }

    #[test]
    fn test_posted_reply_freezes_content() {
        let mut response = draft();
        response.approve("u1").unwrap();
        response.external_reply_id = Some("accounts/1/locations/2/reviews/3/reply".into());

        assert!(matches!(response.edit("Something else".into()), Err(AppError::InvalidTransition(_))));
        assert_eq!(response.content, "Thanks Ana!");
        assert_eq!(response.status, ResponseStatus::Approved);
    }
}

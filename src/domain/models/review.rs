use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use super::UnknownVariant;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    // Rating-derived baseline: 4-5 positive, 3 neutral, anything lower negative.
    pub fn from_rating(star_rating: i32) -> Self {
        if star_rating >= 4 {
            Sentiment::Positive
        } else if star_rating == 3 {
            Sentiment::Neutral
        } else {
            Sentiment::Negative
        }
    }

    pub fn from_label(label: &str) -> Self {
        let label = label.trim().to_lowercase();
        if label.contains("positive") {
            Sentiment::Positive
        } else if label.contains("negative") {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }
}

impl TryFrom<String> for Sentiment {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "positive" => Ok(Sentiment::Positive),
            "neutral" => Ok(Sentiment::Neutral),
            "negative" => Ok(Sentiment::Negative),
            _ => Err(UnknownVariant { kind: "sentiment", value }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Review {
    pub id: String,
    pub business_id: String,
    pub external_review_id: String,
    pub author_name: String,
    pub author_photo_url: Option<String>,
    pub star_rating: i32,
    pub review_text: String,
    pub review_created_at: Option<DateTime<Utc>>,
    pub review_updated_at: Option<DateTime<Utc>>,
    #[sqlx(try_from = "String")]
    pub sentiment: Sentiment,
    pub is_responded: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExternalReview {
    pub external_review_id: String,
    pub author_name: String,
    pub author_photo_url: Option<String>,
    pub star_rating: i32,
    pub text: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PostedReply {
    pub external_reply_id: String,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct UpsertOutcome {
    pub review: Review,
    pub inserted: bool,
}

impl Review {
    pub fn from_external(business_id: &str, external: &ExternalReview) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            business_id: business_id.to_string(),
            external_review_id: external.external_review_id.clone(),
            author_name: external.author_name.clone(),
            author_photo_url: external.author_photo_url.clone(),
            star_rating: external.star_rating.clamp(1, 5),
            review_text: external.text.clone(),
            review_created_at: external.created_at,
            review_updated_at: external.updated_at,
            sentiment: Sentiment::from_rating(external.star_rating),
            is_responded: false,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentiment_from_rating_boundaries() {
        assert_eq!(Sentiment::from_rating(5), Sentiment::Positive);
        assert_eq!(Sentiment::from_rating(4), Sentiment::Positive);
        assert_eq!(Sentiment::from_rating(3), Sentiment::Neutral);
        assert_eq!(Sentiment::from_rating(2), Sentiment::Negative);
        assert_eq!(Sentiment::from_rating(1), Sentiment::Negative);
    }

    #[test]
    fn test_sentiment_from_classifier_label() {
        assert_eq!(Sentiment::from_label("Positive."), Sentiment::Positive);
        assert_eq!(Sentiment::from_label(" NEGATIVE"), Sentiment::Negative);
        assert_eq!(Sentiment::from_label("mixed"), Sentiment::Neutral);
    }
}

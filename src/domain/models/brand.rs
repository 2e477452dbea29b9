use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Professional,
    Friendly,
    Casual,
    Formal,
}

impl Tone {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "friendly" => Tone::Friendly,
            "casual" => Tone::Casual,
            "formal" => Tone::Formal,
            _ => Tone::Professional,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Professional => "professional",
            Tone::Friendly => "friendly",
            Tone::Casual => "casual",
            Tone::Formal => "formal",
        }
    }

    pub fn instructions(&self) -> &'static str {
        match self {
            Tone::Professional => "Use a professional, formal tone. Be courteous and businesslike.",
            Tone::Friendly => "Use a warm, friendly tone. Be personable and approachable.",
            Tone::Casual => "Use a casual, relaxed tone. Be conversational and laid-back.",
            Tone::Formal => "Use a very formal, polite tone. Be respectful and elegant.",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResponseLength {
    Short,
    Medium,
    Long,
}

impl ResponseLength {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "short" => ResponseLength::Short,
            "long" => ResponseLength::Long,
            _ => ResponseLength::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseLength::Short => "short",
            ResponseLength::Medium => "medium",
            ResponseLength::Long => "long",
        }
    }

    pub fn word_budget(&self) -> u32 {
        match self {
            ResponseLength::Short => 75,
            ResponseLength::Medium => 150,
            ResponseLength::Long => 250,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct BrandSettings {
    pub business_id: String,
    pub tone: String,
    pub greeting: Option<String>,
    pub closing: Option<String>,
    pub response_length: String,
    pub include_coupon: bool,
    pub coupon_code: Option<String>,
    pub auto_publish: bool,
    pub notify_on_negative: bool,
    pub updated_at: DateTime<Utc>,
}

impl BrandSettings {
    pub fn defaults_for(business_id: &str) -> Self {
        Self {
            business_id: business_id.to_string(),
            tone: Tone::Professional.as_str().to_string(),
            greeting: None,
            closing: None,
            response_length: ResponseLength::Medium.as_str().to_string(),
            include_coupon: false,
            coupon_code: None,
            auto_publish: false,
            notify_on_negative: true,
            updated_at: Utc::now(),
        }
    }

    pub fn tone(&self) -> Tone {
        Tone::from_label(&self.tone)
    }

    pub fn length(&self) -> ResponseLength {
        ResponseLength::from_label(&self.response_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_fall_back_to_defaults() {
        assert_eq!(Tone::from_label(" Friendly "), Tone::Friendly);
        assert_eq!(Tone::from_label("sarcastic"), Tone::Professional);
        assert_eq!(ResponseLength::from_label("LONG").word_budget(), 250);
        assert_eq!(ResponseLength::from_label("").word_budget(), 150);
    }
}

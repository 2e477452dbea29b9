use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use super::UnknownVariant;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DigestFrequency {
    None,
    Daily,
    Weekly,
}

impl DigestFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            DigestFrequency::None => "none",
            DigestFrequency::Daily => "daily",
            DigestFrequency::Weekly => "weekly",
        }
    }

    pub fn days_back(&self) -> i64 {
        match self {
            DigestFrequency::Weekly => 7,
            _ => 1,
        }
    }
}

impl TryFrom<String> for DigestFrequency {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "none" => Ok(DigestFrequency::None),
            "daily" => Ok(DigestFrequency::Daily),
            "weekly" => Ok(DigestFrequency::Weekly),
            _ => Err(UnknownVariant { kind: "digest frequency", value }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct NotificationPreferences {
    pub tenant_id: String,
    pub email: Option<String>,
    pub email_enabled: bool,
    pub email_for_new_reviews: bool,
    pub email_for_negative_reviews: bool,
    #[sqlx(try_from = "String")]
    pub email_digest: DigestFrequency,
    // 0 = Sunday .. 6 = Saturday; only meaningful for weekly digests.
    pub digest_send_day: Option<i32>,
    pub last_digest_sent: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl NotificationPreferences {
    pub fn defaults_for(tenant_id: &str) -> Self {
        Self {
            tenant_id: tenant_id.to_string(),
            email: None,
            email_enabled: true,
            email_for_new_reviews: true,
            email_for_negative_reviews: true,
            email_digest: DigestFrequency::None,
            digest_send_day: None,
            last_digest_sent: None,
            updated_at: Utc::now(),
        }
    }

    pub fn wants_review_alert(&self, star_rating: i32) -> bool {
        if !self.email_enabled {
            return false;
        }
        if star_rating <= 2 {
            self.email_for_negative_reviews
        } else {
            self.email_for_new_reviews
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_alert_gating() {
        let mut prefs = NotificationPreferences::defaults_for("t1");
        prefs.email_for_new_reviews = false;
        assert!(prefs.wants_review_alert(1));
        assert!(!prefs.wants_review_alert(5));

        prefs.email_enabled = false;
        assert!(!prefs.wants_review_alert(1), "Master switch overrides categories");
    }
}

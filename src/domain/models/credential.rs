use serde::{Deserialize, Serialize};
use chrono::{DateTime, Duration, Utc};
use sqlx::FromRow;

pub const GOOGLE_PROVIDER: &str = "google";

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct ExternalCredential {
    pub tenant_id: String,
    pub provider: String,
    #[serde(skip_serializing)]
    pub access_token: String,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

impl ExternalCredential {
    pub fn new(tenant_id: String, access_token: String, refresh_token: Option<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            tenant_id,
            provider: GOOGLE_PROVIDER.to_string(),
            access_token,
            refresh_token,
            expires_at,
            is_active: true,
            updated_at: Utc::now(),
        }
    }

    pub fn expires_within(&self, now: DateTime<Utc>, skew: Duration) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now + skew)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_skew() {
        let now = Utc::now();
        let skew = Duration::seconds(60);
        let token = |expires_at| ExternalCredential::new("t1".into(), "a".into(), None, expires_at);

        assert!(!token(None).expires_within(now, skew), "Tokens without expiry never expire");
        assert!(!token(Some(now + Duration::minutes(10))).expires_within(now, skew));
        assert!(token(Some(now + Duration::seconds(30))).expires_within(now, skew));
        assert!(token(Some(now - Duration::seconds(1))).expires_within(now, skew));
    }
}

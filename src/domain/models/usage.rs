use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use super::UnknownVariant;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UsageAction {
    AiResponse,
    EmailSent,
}

impl UsageAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageAction::AiResponse => "ai_response",
            UsageAction::EmailSent => "email_sent",
        }
    }
}

impl TryFrom<String> for UsageAction {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "ai_response" => Ok(UsageAction::AiResponse),
            "email_sent" => Ok(UsageAction::EmailSent),
            _ => Err(UnknownVariant { kind: "usage action", value }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct UsageLedgerEntry {
    pub id: String,
    pub tenant_id: String,
    pub business_id: Option<String>,
    #[sqlx(try_from = "String")]
    pub action: UsageAction,
    pub tokens_used: i32,
    pub cost_cents: i32,
    pub created_at: DateTime<Utc>,
}

impl UsageLedgerEntry {
    pub fn new(tenant_id: String, business_id: Option<String>, action: UsageAction, tokens_used: i32, cost_cents: i32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tenant_id,
            business_id,
            action,
            tokens_used,
            cost_cents,
            created_at: Utc::now(),
        }
    }
}

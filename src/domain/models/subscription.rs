use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

pub const ENTITLED_STATUSES: [&str; 2] = ["active", "trialing"];

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Free,
    Starter,
    Professional,
    Business,
    Agency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    AtMost(i64),
    Unlimited,
}

impl Limit {
    pub fn allows(&self, used: i64) -> bool {
        match self {
            Limit::AtMost(max) => used < *max,
            Limit::Unlimited => true,
        }
    }

    // Wire representation: `-1` stands for unlimited.
    pub fn as_sentinel(&self) -> i64 {
        match self {
            Limit::AtMost(max) => *max,
            Limit::Unlimited => -1,
        }
    }

    pub fn remaining(&self, used: i64) -> i64 {
        match self {
            Limit::AtMost(max) => (max - used).max(0),
            Limit::Unlimited => -1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanLimits {
    pub ai_responses: Limit,
    pub locations: Limit,
}

impl PlanTier {
    pub fn from_plan_type(plan_type: Option<&str>) -> Self {
        match plan_type.map(|p| p.trim().to_lowercase()).as_deref() {
            Some("starter") => PlanTier::Starter,
            Some("professional") => PlanTier::Professional,
            Some("business") => PlanTier::Business,
            Some("agency") => PlanTier::Agency,
            _ => PlanTier::Free,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Starter => "starter",
            PlanTier::Professional => "professional",
            PlanTier::Business => "business",
            PlanTier::Agency => "agency",
        }
    }

    pub fn limits(&self) -> PlanLimits {
        match self {
            PlanTier::Free => PlanLimits { ai_responses: Limit::AtMost(5), locations: Limit::AtMost(1) },
            PlanTier::Starter => PlanLimits { ai_responses: Limit::AtMost(50), locations: Limit::AtMost(1) },
            PlanTier::Professional => PlanLimits { ai_responses: Limit::AtMost(200), locations: Limit::AtMost(3) },
            PlanTier::Business => PlanLimits { ai_responses: Limit::Unlimited, locations: Limit::AtMost(10) },
            PlanTier::Agency => PlanLimits { ai_responses: Limit::Unlimited, locations: Limit::Unlimited },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Subscription {
    pub id: String,
    pub tenant_id: String,
    pub status: String,
    pub plan_type: Option<String>,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    pub fn new(tenant_id: String, status: &str, plan_type: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tenant_id,
            status: status.to_string(),
            plan_type: plan_type.map(str::to_string),
            current_period_start: None,
            current_period_end: None,
            created_at: Utc::now(),
        }
    }

    pub fn tier(&self) -> PlanTier {
        PlanTier::from_plan_type(self.plan_type.as_deref())
    }
}

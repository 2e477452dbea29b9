use std::sync::Arc;
use serde::Serialize;
use tracing::{info, instrument};
use crate::domain::{
    models::{subscription::{PlanTier, Limit}, usage::UsageAction},
    ports::{BusinessRepository, SubscriptionRepository, UsageRepository},
};
use crate::error::AppError;

// Response quota decision. `limit` and `remaining` use `-1` for unlimited.
#[derive(Debug, Serialize, Clone)]
pub struct ResponseQuota {
    pub allowed: bool,
    pub used: i64,
    pub limit: i64,
    pub remaining: i64,
    pub plan: PlanTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Clone)]
pub struct LocationQuota {
    pub allowed: bool,
    pub used: i64,
    pub limit: i64,
    pub plan: PlanTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

pub struct QuotaService {
    subscriptions: Arc<dyn SubscriptionRepository>,
    usage: Arc<dyn UsageRepository>,
    businesses: Arc<dyn BusinessRepository>,
}

impl QuotaService {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        usage: Arc<dyn UsageRepository>,
        businesses: Arc<dyn BusinessRepository>,
    ) -> Self {
        Self { subscriptions, usage, businesses }
    }

    #[instrument(skip(self))]
    pub async fn check_response_quota(&self, tenant_id: &str) -> Result<ResponseQuota, AppError> {
        let subscription = self.subscriptions.find_active(tenant_id).await?;
        let plan = subscription.as_ref().map(|s| s.tier()).unwrap_or(PlanTier::Free);
        let period_start = subscription.as_ref().and_then(|s| s.current_period_start);

        let limit = plan.limits().ai_responses;
        let used = self.usage.count_since(tenant_id, UsageAction::AiResponse, period_start).await?;
        let allowed = limit.allows(used);

        let reason = (!allowed).then(|| limit_reason(plan, limit, "AI responses", "generating responses"));
        if !allowed {
            info!("Response quota exhausted for tenant {} on {} plan ({} used)", tenant_id, plan.as_str(), used);
        }

        Ok(ResponseQuota {
            allowed,
            used,
            limit: limit.as_sentinel(),
            remaining: limit.remaining(used),
            plan,
            reason,
        })
    }

    #[instrument(skip(self))]
    pub async fn check_location_quota(&self, tenant_id: &str) -> Result<LocationQuota, AppError> {
        let plan = self.subscriptions.find_active(tenant_id).await?
            .map(|s| s.tier())
            .unwrap_or(PlanTier::Free);

        let limit = plan.limits().locations;
        let used = self.businesses.count_active_by_tenant(tenant_id).await?;
        let allowed = limit.allows(used);

        Ok(LocationQuota {
            allowed,
            used,
            limit: limit.as_sentinel(),
            plan,
            reason: (!allowed).then(|| limit_reason(plan, limit, "business locations", "adding locations")),
        })
    }
}

fn limit_reason(plan: PlanTier, limit: Limit, noun: &str, action: &str) -> String {
    format!(
        "You have reached your {} plan limit of {} {}. Upgrade your plan to continue {}.",
        plan.as_str(),
        limit.as_sentinel(),
        noun,
        action
    )
}

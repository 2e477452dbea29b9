use std::sync::Arc;
use tera::{Context, Tera};
use tracing::{info, instrument};
use crate::domain::{
    models::{
        job::JobPayload,
        usage::{UsageAction, UsageLedgerEntry},
    },
    ports::{
        BusinessRepository, EmailService, NotificationPreferencesRepository, ReviewRepository,
        TenantRepository, UsageRepository,
    },
};
use crate::error::AppError;

pub const NEW_REVIEW_TEMPLATE: &str = "new_review.html";
const EXCERPT_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Skipped(String),
}

pub struct NotificationService {
    tenants: Arc<dyn TenantRepository>,
    businesses: Arc<dyn BusinessRepository>,
    reviews: Arc<dyn ReviewRepository>,
    preferences: Arc<dyn NotificationPreferencesRepository>,
    usage: Arc<dyn UsageRepository>,
    email: Arc<dyn EmailService>,
    templates: Arc<Tera>,
    app_url: String,
}

impl NotificationService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tenants: Arc<dyn TenantRepository>,
        businesses: Arc<dyn BusinessRepository>,
        reviews: Arc<dyn ReviewRepository>,
        preferences: Arc<dyn NotificationPreferencesRepository>,
        usage: Arc<dyn UsageRepository>,
        email: Arc<dyn EmailService>,
        templates: Arc<Tera>,
        app_url: String,
    ) -> Self {
        Self { tenants, businesses, reviews, preferences, usage, email, templates, app_url }
    }

    #[instrument(skip(self), fields(review_id = %payload.review_id))]
    pub async fn deliver_new_review(&self, payload: &JobPayload) -> Result<Delivery, AppError> {
        let Some(prefs) = self.preferences.find_by_tenant(&payload.tenant_id).await? else {
            return Ok(Delivery::Skipped("no notification preferences".into()));
        };

        let review = self.reviews.find_by_id(&payload.review_id).await?
            .ok_or_else(|| AppError::NotFound(format!("Review {} not found", payload.review_id)))?;

        if !prefs.wants_review_alert(review.star_rating) {
            return Ok(Delivery::Skipped("alerts disabled for this rating".into()));
        }

        let business = self.businesses.find_by_id(&payload.tenant_id, &payload.business_id).await?
            .ok_or_else(|| AppError::NotFound(format!("Business {} not found", payload.business_id)))?;

        let recipient = match prefs.email.clone().filter(|e| !e.trim().is_empty()) {
            Some(email) => email,
            None => {
                self.tenants.find_by_id(&payload.tenant_id).await?
                    .ok_or_else(|| AppError::NotFound(format!("Tenant {} not found", payload.tenant_id)))?
                    .email
            }
        };

        let rating = review.star_rating.clamp(1, 5) as usize;
        let mut excerpt: String = review.review_text.chars().take(EXCERPT_CHARS).collect();
        if review.review_text.chars().count() > EXCERPT_CHARS {
            excerpt.push_str("...");
        }

        let mut context = Context::new();
        context.insert("business_name", &business.name);
        context.insert("reviewer_name", &review.author_name);
        context.insert("stars", &format!("{}{}", "★".repeat(rating), "☆".repeat(5 - rating)));
        context.insert("sentiment", review.sentiment.as_str());
        context.insert("excerpt", &excerpt);
        context.insert("review_url", &format!("{}/reviews", self.app_url));

        let html = self.templates.render(NEW_REVIEW_TEMPLATE, &context)
            .map_err(|e| AppError::InternalWithMsg(format!("Tera render error: {:?}", e)))?;
        let subject = format!("New {}-star review for {}", review.star_rating, business.name);

        self.email.send(&recipient, &subject, &html).await?;
        self.usage.record(&UsageLedgerEntry::new(
            payload.tenant_id.clone(),
            Some(business.id.clone()),
            UsageAction::EmailSent,
            0,
            0,
        )).await?;

        info!("New review alert sent to {}", recipient);
        Ok(Delivery::Sent)
    }
}

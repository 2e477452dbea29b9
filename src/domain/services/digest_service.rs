use std::sync::Arc;
use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Serialize;
use tera::{Context, Tera};
use tracing::{error, info, instrument};
use crate::domain::{
    models::{
        notification::{DigestFrequency, NotificationPreferences},
        review::Review,
    },
    ports::{
        BusinessRepository, EmailService, NotificationPreferencesRepository, ReviewRepository,
        TenantRepository,
    },
};
use crate::error::AppError;

pub const DIGEST_TEMPLATE: &str = "digest.html";

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DigestStats {
    pub business_name: String,
    pub new_reviews: usize,
    pub avg_rating: f64,
    pub five_star: usize,
    pub four_star: usize,
    pub three_star: usize,
    pub two_star: usize,
    pub one_star: usize,
    pub responded_count: usize,
    pub pending_count: usize,
    pub positive_percentage: f64,
}

// Period statistics for one business. An empty period reads as 100% positive.
pub fn compute_stats(business_name: &str, reviews: &[Review]) -> DigestStats {
    let count = |stars: i32| reviews.iter().filter(|r| r.star_rating == stars).count();
    let new_reviews = reviews.len();
    let (five_star, four_star) = (count(5), count(4));
    let responded_count = reviews.iter().filter(|r| r.is_responded).count();

    let avg_rating = if new_reviews > 0 {
        reviews.iter().map(|r| f64::from(r.star_rating)).sum::<f64>() / new_reviews as f64
    } else {
        0.0
    };
    let positive_percentage = if new_reviews > 0 {
        (five_star + four_star) as f64 / new_reviews as f64 * 100.0
    } else {
        100.0
    };

    DigestStats {
        business_name: business_name.to_string(),
        new_reviews,
        avg_rating,
        five_star,
        four_star,
        three_star: count(3),
        two_star: count(2),
        one_star: count(1),
        responded_count,
        pending_count: new_reviews - responded_count,
        positive_percentage,
    }
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RecipientStatus {
    pub tenant_id: String,
    pub status: String,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DigestReport {
    pub success: bool,
    pub timestamp: DateTime<Utc>,
    pub day_of_week: u32,
    pub daily_sent: usize,
    pub weekly_sent: usize,
    pub recipients: Vec<RecipientStatus>,
}

pub struct DigestService {
    preferences: Arc<dyn NotificationPreferencesRepository>,
    tenants: Arc<dyn TenantRepository>,
    businesses: Arc<dyn BusinessRepository>,
    reviews: Arc<dyn ReviewRepository>,
    email: Arc<dyn EmailService>,
    templates: Arc<Tera>,
    app_url: String,
}

impl DigestService {
    pub fn new(
        preferences: Arc<dyn NotificationPreferencesRepository>,
        tenants: Arc<dyn TenantRepository>,
        businesses: Arc<dyn BusinessRepository>,
        reviews: Arc<dyn ReviewRepository>,
        email: Arc<dyn EmailService>,
        templates: Arc<Tera>,
        app_url: String,
    ) -> Self {
        Self { preferences, tenants, businesses, reviews, email, templates, app_url }
    }

    /// Sends the digests due at `now`: every daily subscriber, and weekly subscribers whose
    /// send day is today. Failures are recorded per recipient.
    #[instrument(skip(self))]
    pub async fn send_due(&self, now: DateTime<Utc>) -> Result<DigestReport, AppError> {
        let day_of_week = now.weekday().num_days_from_sunday();
        let due: Vec<NotificationPreferences> = self.preferences.list_digest_subscribers().await?
            .into_iter()
            .filter(|p| match p.email_digest {
                DigestFrequency::Daily => true,
                DigestFrequency::Weekly => p.digest_send_day == Some(day_of_week as i32),
                DigestFrequency::None => false,
            })
            .collect();

        info!("{} digest recipients due (day {})", due.len(), day_of_week);

        let mut report = DigestReport {
            success: true,
            timestamp: now,
            day_of_week,
            daily_sent: 0,
            weekly_sent: 0,
            recipients: Vec::with_capacity(due.len()),
        };

        for prefs in due {
            let status = match self.send_one(&prefs, now).await {
                Ok(status) => status,
                Err(e) => {
                    error!("Digest failed for tenant {}: {}", prefs.tenant_id, e);
                    format!("error: {}", e)
                }
            };

            if status == "sent" {
                match prefs.email_digest {
                    DigestFrequency::Weekly => report.weekly_sent += 1,
                    _ => report.daily_sent += 1,
                }
            }
            report.recipients.push(RecipientStatus { tenant_id: prefs.tenant_id.clone(), status });
        }

        Ok(report)
    }

    async fn send_one(&self, prefs: &NotificationPreferences, now: DateTime<Utc>) -> Result<String, AppError> {
        let tenant = self.tenants.find_by_id(&prefs.tenant_id).await?;
        let recipient = prefs.email.clone()
            .filter(|e| !e.trim().is_empty())
            .or_else(|| tenant.as_ref().map(|t| t.email.clone()).filter(|e| !e.trim().is_empty()));
        let Some(recipient) = recipient else {
            return Ok("error: no email".to_string());
        };

        let since = now - Duration::days(prefs.email_digest.days_back());
        let mut stats = Vec::new();
        for business in self.businesses.list_by_tenant(&prefs.tenant_id).await? {
            if !business.is_active {
                continue;
            }
            let reviews = self.reviews.list_by_business_since(&business.id, since).await?;
            stats.push(compute_stats(&business.name, &reviews));
        }

        if stats.iter().all(|s| s.new_reviews == 0) {
            return Ok("skipped: no activity".to_string());
        }

        let weekly = prefs.email_digest == DigestFrequency::Weekly;
        let total_pending: usize = stats.iter().map(|s| s.pending_count).sum();

        let mut context = Context::new();
        context.insert("user_name", &tenant.as_ref().map(|t| t.name.clone()).unwrap_or_default());
        context.insert("period_text", if weekly { "this week" } else { "today" });
        context.insert("businesses", &stats);
        context.insert("total_pending", &total_pending);
        context.insert("app_url", &self.app_url);

        let html = self.templates.render(DIGEST_TEMPLATE, &context)
            .map_err(|e| AppError::InternalWithMsg(format!("Tera render error: {:?}", e)))?;
        let date = now.format("%Y-%m-%d");
        let subject = if weekly {
            format!("Your weekly review digest - Week of {}", date)
        } else {
            format!("Your daily review digest - {}", date)
        };

        self.email.send(&recipient, &subject, &html).await?;
        self.preferences.mark_digest_sent(&prefs.tenant_id, now).await?;

        Ok("sent".to_string())
    }
}

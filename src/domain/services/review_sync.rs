use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::sleep;
use tracing::{error, info, info_span, warn, Instrument};
use crate::domain::{
    models::{business::Business, review::Review},
    ports::{BusinessRepository, NotificationSender, ReviewRepository, ReviewSource, SentimentClassifier},
};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessSyncOutcome {
    pub reviews_count: usize,
    pub new_reviews: usize,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BusinessSyncStatus {
    pub id: String,
    pub status: String,
    pub reviews_count: usize,
    pub new_reviews: usize,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub success: bool,
    pub timestamp: DateTime<Utc>,
    pub synced: usize,
    pub errors: usize,
    pub businesses: Vec<BusinessSyncStatus>,
}

pub struct ReviewSyncService {
    businesses: Arc<dyn BusinessRepository>,
    reviews: Arc<dyn ReviewRepository>,
    source: Arc<dyn ReviewSource>,
    notifier: Arc<dyn NotificationSender>,
    classifier: Option<Arc<dyn SentimentClassifier>>,
    sync_delay: Duration,
}

impl ReviewSyncService {
    pub fn new(
        businesses: Arc<dyn BusinessRepository>,
        reviews: Arc<dyn ReviewRepository>,
        source: Arc<dyn ReviewSource>,
        notifier: Arc<dyn NotificationSender>,
        sync_delay: Duration,
    ) -> Self {
        Self { businesses, reviews, source, notifier, classifier: None, sync_delay }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn SentimentClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Mirrors one business's upstream reviews. Only rows that did not exist before are
    /// handed to the notifier.
    pub async fn sync_business(&self, business: &Business) -> Result<BusinessSyncOutcome, AppError> {
        if !business.is_active {
            return Err(AppError::Validation(format!("Business {} is inactive", business.id)));
        }
        let location = business.location_ref().ok_or(AppError::NotConnected)?;

        let external = self.source.list_reviews(&business.tenant_id, &location).await?;
        info!("Fetched {} reviews from upstream", external.len());

        let mut new_reviews = 0;
        for item in &external {
            let candidate = Review::from_external(&business.id, item);
            let outcome = self.reviews.upsert(&candidate).await?;
            if !outcome.inserted {
                continue;
            }
            new_reviews += 1;

            let mut review = outcome.review;
            if let Some(classifier) = &self.classifier
                && !review.review_text.trim().is_empty()
            {
                match classifier.classify(&review.review_text).await {
                    Ok(sentiment) if sentiment != review.sentiment => {
                        match self.reviews.update_sentiment(&review.id, sentiment).await {
                            Ok(()) => review.sentiment = sentiment,
                            Err(e) => warn!("Failed to store sentiment for review {}: {}", review.id, e),
                        }
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Sentiment classification failed for review {}: {}", review.id, e),
                }
            }

            if let Err(e) = self.notifier.notify_new_review(&business.tenant_id, business, &review).await {
                error!("Failed to queue notification for review {}: {}", review.id, e);
            }
        }

        self.businesses.mark_synced(&business.id, Utc::now()).await?;

        Ok(BusinessSyncOutcome { reviews_count: external.len(), new_reviews })
    }

    pub async fn sync_all(&self) -> Result<SyncReport, AppError> {
        let businesses = self.businesses.list_syncable().await?;
        info!("Starting review sync for {} businesses", businesses.len());

        let mut statuses = Vec::with_capacity(businesses.len());
        let mut synced = 0;
        let mut errors = 0;

        for (index, business) in businesses.iter().enumerate() {
            if index > 0 && !self.sync_delay.is_zero() {
                sleep(self.sync_delay).await;
            }

            let span = info_span!("sync_business", business_id = %business.id, tenant_id = %business.tenant_id);
            let result = self.sync_business(business).instrument(span).await;

            match result {
                Ok(outcome) => {
                    synced += 1;
                    statuses.push(BusinessSyncStatus {
                        id: business.id.clone(),
                        status: "success".to_string(),
                        reviews_count: outcome.reviews_count,
                        new_reviews: outcome.new_reviews,
                    });
                }
                Err(e) => {
                    errors += 1;
                    error!("Review sync failed for business {}: {}", business.id, e);
                    statuses.push(BusinessSyncStatus {
                        id: business.id.clone(),
                        status: format!("error: {}", e),
                        reviews_count: 0,
                        new_reviews: 0,
                    });
                }
            }
        }

        info!("Review sync finished: {} synced, {} errors", synced, errors);

        Ok(SyncReport {
            success: true,
            timestamp: Utc::now(),
            synced,
            errors,
            businesses: statuses,
        })
    }
}

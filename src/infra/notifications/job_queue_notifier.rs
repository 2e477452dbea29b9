use std::sync::Arc;
use async_trait::async_trait;
use chrono::Utc;
use tracing::info;
use crate::domain::{
    models::{business::Business, job::{Job, JobPayload, JOB_NEW_REVIEW}, review::Review},
    ports::{JobRepository, NotificationSender},
};
use crate::error::AppError;

pub struct JobQueueNotifier {
    jobs: Arc<dyn JobRepository>,
}

impl JobQueueNotifier {
    pub fn new(jobs: Arc<dyn JobRepository>) -> Self {
        Self { jobs }
    }
}

#[async_trait]
impl NotificationSender for JobQueueNotifier {
    async fn notify_new_review(&self, tenant_id: &str, business: &Business, review: &Review) -> Result<(), AppError> {
        let job = Job::new(
            JOB_NEW_REVIEW,
            JobPayload {
                tenant_id: tenant_id.to_string(),
                business_id: business.id.clone(),
                review_id: review.id.clone(),
            },
            Utc::now(),
        );
        let job = self.jobs.create(&job).await?;
        info!("Queued {} job {} for review {}", JOB_NEW_REVIEW, job.id, review.id);
        Ok(())
    }
}

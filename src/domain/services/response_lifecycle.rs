use std::sync::Arc;
use tracing::{info, instrument, warn};
use crate::domain::{
    models::{business::Business, response::{Response, ResponseStatus}},
    ports::{BusinessRepository, ResponseRepository, ReviewRepository, ReviewSource},
};
use crate::error::AppError;

pub struct ResponseLifecycle {
    responses: Arc<dyn ResponseRepository>,
    reviews: Arc<dyn ReviewRepository>,
    businesses: Arc<dyn BusinessRepository>,
    source: Arc<dyn ReviewSource>,
}

impl ResponseLifecycle {
    pub fn new(
        responses: Arc<dyn ResponseRepository>,
        reviews: Arc<dyn ReviewRepository>,
        businesses: Arc<dyn BusinessRepository>,
        source: Arc<dyn ReviewSource>,
    ) -> Self {
        Self { responses, reviews, businesses, source }
    }

    async fn load(&self, tenant_id: &str, id: &str) -> Result<(Response, Business), AppError> {
        let not_found = || AppError::NotFound(format!("Response {} not found", id));
        let response = self.responses.find_by_id(id).await?.ok_or_else(not_found)?;
        let business = self.businesses.find_by_id(tenant_id, &response.business_id).await?
            .ok_or_else(not_found)?;
        Ok((response, business))
    }

    pub async fn get(&self, tenant_id: &str, id: &str) -> Result<Response, AppError> {
        Ok(self.load(tenant_id, id).await?.0)
    }

    async fn save(&self, response: &Response, expected_version: i32) -> Result<Response, AppError> {
        self.responses.update_draft(response, expected_version).await?
            .ok_or_else(|| AppError::Conflict(format!("Response {} was modified concurrently; reload and retry", response.id)))
    }

    #[instrument(skip(self))]
    pub async fn approve(&self, tenant_id: &str, id: &str, approver_id: &str) -> Result<Response, AppError> {
        let (mut response, _) = self.load(tenant_id, id).await?;
        let version = response.version;
        response.approve(approver_id)?;
        let saved = self.save(&response, version).await?;
        info!("Response {} approved by {}", saved.id, approver_id);
        Ok(saved)
    }

    #[instrument(skip(self, content))]
    pub async fn edit_content(
        &self,
        tenant_id: &str,
        id: &str,
        content: String,
        expected_version: Option<i32>,
    ) -> Result<Response, AppError> {
        let content = content.trim().to_string();
        if content.is_empty() {
            return Err(AppError::Validation("Response content cannot be empty".into()));
        }

        let (mut response, _) = self.load(tenant_id, id).await?;
        if let Some(expected) = expected_version
            && expected != response.version
        {
            return Err(AppError::Conflict(format!(
                "Response {} is at version {}, not {}",
                response.id, response.version, expected
            )));
        }

        let version = response.version;
        response.edit(content)?;
        self.save(&response, version).await
    }

    #[instrument(skip(self, reason))]
    pub async fn reject(&self, tenant_id: &str, id: &str, reason: String) -> Result<Response, AppError> {
        let (mut response, _) = self.load(tenant_id, id).await?;
        let version = response.version;
        response.annotate_rejection(reason)?;
        self.save(&response, version).await
    }

    /// Posts the reply upstream, then commits locally. The external reply id is stored first,
    /// so a retry after a failed commit does not post twice.
    #[instrument(skip(self))]
    pub async fn publish(&self, tenant_id: &str, id: &str) -> Result<Response, AppError> {
        let (mut response, business) = self.load(tenant_id, id).await?;
        if response.status == ResponseStatus::Published {
            return Err(AppError::InvalidTransition(format!("Response {} is already published", response.id)));
        }
        response.ensure_publishable()?;

        let location = business.location_ref().ok_or(AppError::NotConnected)?;

        if response.external_reply_id.is_some() {
            warn!("Response {} already posted upstream; completing local commit only", response.id);
        } else {
            let review = self.reviews.find_by_id(&response.review_id).await?
                .ok_or_else(|| AppError::NotFound(format!("Review {} not found", response.review_id)))?;

            let posted = self.source
                .post_reply(tenant_id, &location, &review.external_review_id, &response.content)
                .await?;
            self.responses.record_external_reply(&response.id, &posted).await?;

            response.external_reply_id = Some(posted.external_reply_id);
            response.published_at = Some(posted.published_at);
        }

        let published = self.responses.commit_publish(&response).await?;
        info!("Response {} published for business {}", published.id, business.id);
        Ok(published)
    }
}

use serde::Serialize;
use crate::domain::services::quota::{LocationQuota, ResponseQuota};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct SyncBusinessResponse {
    pub business_id: String,
    pub reviews_count: usize,
    pub new_reviews: usize,
}

#[derive(Serialize)]
pub struct UsageResponse {
    pub responses: ResponseQuota,
    pub locations: LocationQuota,
}

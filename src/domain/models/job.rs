use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

pub const JOB_NEW_REVIEW: &str = "NEW_REVIEW";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JobPayload {
    pub tenant_id: String,
    pub business_id: String,
    pub review_id: String,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Job {
    pub id: String,
    pub job_type: String,
    pub payload: Json<JobPayload>,
    pub execute_at: DateTime<Utc>,
    pub status: String, // PENDING, PROCESSING, COMPLETED, SKIPPED, FAILED
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn new(job_type: &str, payload: JobPayload, execute_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            job_type: job_type.to_string(),
            payload: Json(payload),
            execute_at,
            status: "PENDING".to_string(),
            error_message: None,
            created_at: Utc::now(),
        }
    }
}

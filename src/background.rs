use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn, info_span, Instrument};
use crate::state::AppState;
use crate::domain::models::job::{Job, JOB_NEW_REVIEW};
use crate::domain::services::notification_service::Delivery;
use crate::error::AppError;

const POLL_INTERVAL: Duration = Duration::from_secs(5);
const BATCH_SIZE: i32 = 10;

pub async fn start_background_worker(state: Arc<AppState>) {
    info!("Starting background job worker...");

    loop {
        run_pending_jobs(&state).await;
        sleep(POLL_INTERVAL).await;
    }
}

/// Claims one batch of due jobs and runs them to a terminal status.
pub async fn run_pending_jobs(state: &Arc<AppState>) {
    let jobs = match state.job_repo.find_pending(BATCH_SIZE).await {
        Ok(jobs) => jobs,
        Err(e) => {
            error!("Failed to fetch pending jobs: {:?}", e);
            return;
        }
    };

    for job in jobs {
        let span = info_span!(
            "background_job",
            job_id = %job.id,
            job_type = %job.job_type,
            tenant_id = %job.payload.tenant_id
        );

        async {
            info!("Processing job: {}", job.job_type);
            let (status, message) = match process_job(state, &job).await {
                Ok(Delivery::Sent) => {
                    info!("Job completed successfully");
                    ("COMPLETED", None)
                }
                Ok(Delivery::Skipped(reason)) => {
                    info!("Job skipped: {}", reason);
                    ("SKIPPED", Some(reason))
                }
                Err(e) => {
                    let err_msg = format!("{}", e);
                    error!("Job failed with error: {}", err_msg);
                    ("FAILED", Some(err_msg))
                }
            };

            if let Err(e) = state.job_repo.update_status(&job.id, status, message).await {
                error!("Failed to mark job as {}: {:?}", status, e);
            }
        }
            .instrument(span)
            .await;
    }
}

async fn process_job(state: &Arc<AppState>, job: &Job) -> Result<Delivery, AppError> {
    match job.job_type.as_str() {
        JOB_NEW_REVIEW => state.notification_service().deliver_new_review(&job.payload).await,
        other => {
            warn!("Unknown job type {}", other);
            Err(AppError::InternalWithMsg(format!("Unknown job type: {}", other)))
        }
    }
}

pub async fn start_sync_scheduler(state: Arc<AppState>, interval: Duration) {
    info!("Starting review sync scheduler (every {:?})", interval);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let span = info_span!("scheduled_sync");
        async {
            match state.review_sync().sync_all().await {
                Ok(report) => info!("Scheduled sync finished: {} synced, {} errors", report.synced, report.errors),
                Err(e) => error!("Scheduled sync failed: {}", e),
            }
        }
            .instrument(span)
            .await;
    }
}

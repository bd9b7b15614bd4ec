//! Placeholder batch-job toggle. Stateless: both verbs log and acknowledge.
//! Periodic execution is the caller's business (see `crate::batch_job`).

use axum::Json;

use crate::backend::MessageResponse;

pub const STARTED_MESSAGE: &str = "Dummy batch job successfully executed";
pub const STOPPED_MESSAGE: &str = "Dummy batch job stopped";

/// `POST /api/batchjob`
pub async fn start() -> Json<MessageResponse> {
    tracing::info!("Batch job (placeholder) executed");
    Json(MessageResponse::new(STARTED_MESSAGE))
}

/// `DELETE /api/batchjob`
pub async fn stop() -> Json<MessageResponse> {
    tracing::info!("Batch job (placeholder) stopped");
    Json(MessageResponse::new(STOPPED_MESSAGE))
}

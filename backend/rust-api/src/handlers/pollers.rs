use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::models::stats::PollTaskStatus;
use crate::services::AppState;

use super::ApiError;

/// GET /api/v1/pollers - status of every polling task
pub async fn list_pollers(State(state): State<Arc<AppState>>) -> Json<Vec<PollTaskStatus>> {
    Json(state.poller_statuses())
}

/// POST /api/v1/pollers/:name/start
pub async fn start_poller(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<PollTaskStatus>, ApiError> {
    let task = state
        .poller(&name)
        .ok_or_else(|| ApiError::not_found(format!("Poller {} not found", name)))?;
    task.start();
    Ok(Json(task.status()))
}

/// POST /api/v1/pollers/:name/stop - clears the timer flag only; an
/// in-flight fetch still completes
pub async fn stop_poller(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<PollTaskStatus>, ApiError> {
    let task = state
        .poller(&name)
        .ok_or_else(|| ApiError::not_found(format!("Poller {} not found", name)))?;
    task.stop();
    Ok(Json(task.status()))
}

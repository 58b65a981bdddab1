use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::extractors::AppJson;
use crate::metrics::COLLEGE_FALLBACK_ACTIVE;
use crate::models::college::{CollegeDirectoryResponse, CreateCollegeRequest};
use crate::models::notification::NotificationLevel;
use crate::services::college_service::{RefreshOutcome, StoreError};
use crate::services::pollers;
use crate::services::AppState;

use super::ApiError;

/// GET /api/v1/colleges - current view, table or derived
pub async fn list_colleges(State(state): State<Arc<AppState>>) -> Json<CollegeDirectoryResponse> {
    Json(state.colleges.response().await)
}

/// POST /api/v1/colleges - rejected while the breaker pins derived mode
pub async fn create_college(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CreateCollegeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let college = state
        .colleges
        .create(&req.name)
        .await
        .map_err(map_store_error)?;

    // refresh the cached view so the new entry shows without waiting a tick
    if let Err(err) = pollers::refresh_colleges(&state).await {
        tracing::warn!(error = %err, "College view refresh after create failed");
    }

    state.notifications.push(
        NotificationLevel::Info,
        format!("College {} added", college.name),
    );

    Ok((StatusCode::CREATED, Json(college)))
}

/// DELETE /api/v1/colleges/:id
pub async fn delete_college(
    State(state): State<Arc<AppState>>,
    Path(college_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .colleges
        .remove(&college_id)
        .await
        .map_err(map_store_error)?;
    if !deleted {
        return Err(ApiError::not_found("College not found"));
    }

    if let Err(err) = pollers::refresh_colleges(&state).await {
        tracing::warn!(error = %err, "College view refresh after delete failed");
    }

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/colleges/retry - the only way to reset the breaker
pub async fn retry_colleges(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CollegeDirectoryResponse>, ApiError> {
    let student_colleges = pollers::student_college_names(&state).await;
    let outcome = state
        .colleges
        .retry(&student_colleges)
        .await
        .map_err(map_store_error)?;

    match outcome {
        RefreshOutcome::Table => {
            COLLEGE_FALLBACK_ACTIVE.set(0);
            state
                .notifications
                .push(NotificationLevel::Info, "College collection back online");
        }
        RefreshOutcome::FallbackPinned | RefreshOutcome::Derived => {
            COLLEGE_FALLBACK_ACTIVE.set(1);
        }
    }

    Ok(Json(state.colleges.response().await))
}

fn map_store_error(err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound(collection) => {
            ApiError::not_found(format!("Collection {} not found", collection))
        }
        StoreError::Halted => ApiError::conflict(
            "College collection unavailable; showing derived list. Retry the college sync first.",
        ),
        StoreError::Other(err) => ApiError::Internal(err.to_string()),
    }
}

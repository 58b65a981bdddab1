use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::extractors::AppJson;
use crate::models::notification::NotificationLevel;
use crate::models::student::{
    CreateStudentRequest, ListStudentsQuery, StudentResponse, UpdateStudentRequest,
};
use crate::services::student_service::StudentService;
use crate::services::AppState;

use super::{classify_service_error, ApiError};

/// GET /api/v1/students - filtered listing for the management tab
pub async fn list_students(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListStudentsQuery>,
) -> Result<Json<Vec<StudentResponse>>, ApiError> {
    let service = StudentService::new(state.mongo.clone(), state.config.collections.clone());
    let students = service
        .list(query)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(students))
}

/// POST /api/v1/students
pub async fn create_student(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CreateStudentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let service = StudentService::new(state.mongo.clone(), state.config.collections.clone());
    let created = service.create(req).await.map_err(|e| {
        tracing::error!("Failed to create student: {:?}", e);
        classify_service_error(e)
    })?;

    state.notifications.push(
        NotificationLevel::Info,
        format!("Student {} added", created.email),
    );

    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /api/v1/students/:id
pub async fn update_student(
    State(state): State<Arc<AppState>>,
    Path(student_id): Path<String>,
    AppJson(req): AppJson<UpdateStudentRequest>,
) -> Result<Json<StudentResponse>, ApiError> {
    let service = StudentService::new(state.mongo.clone(), state.config.collections.clone());
    let updated = service
        .update(&student_id, req)
        .await
        .map_err(classify_service_error)?;
    Ok(Json(updated))
}

/// DELETE /api/v1/students/:id
pub async fn delete_student(
    State(state): State<Arc<AppState>>,
    Path(student_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = StudentService::new(state.mongo.clone(), state.config.collections.clone());
    service
        .delete(&student_id)
        .await
        .map_err(classify_service_error)?;
    Ok(StatusCode::NO_CONTENT)
}

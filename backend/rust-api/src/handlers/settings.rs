use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::extractors::AppJson;
use crate::metrics::CREDENTIAL_CHANGES_TOTAL;
use crate::models::notification::NotificationLevel;
use crate::models::settings::{
    ChangeCredentialsRequest, PreferenceResponse, UpdatePreferenceRequest,
};
use crate::services::settings_service::SettingsService;
use crate::services::AppState;

use super::{classify_service_error, ApiError};

/// POST /api/v1/settings/credentials - plaintext compare-and-overwrite on the
/// account keyed by email; the notification feed is the only audit trail.
pub async fn change_credentials(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<ChangeCredentialsRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let email = req.email.clone();
    let service = SettingsService::new(state.mongo.clone(), state.config.collections.clone());

    match service.change_credentials(req).await {
        Ok(()) => {
            CREDENTIAL_CHANGES_TOTAL.with_label_values(&["success"]).inc();
            state.notifications.push(
                NotificationLevel::Info,
                format!("Credentials updated for {}", email),
            );
            Ok(Json(serde_json::json!({ "status": "ok" })))
        }
        Err(err) => {
            CREDENTIAL_CHANGES_TOTAL.with_label_values(&["rejected"]).inc();
            Err(classify_service_error(err))
        }
    }
}

/// GET /api/v1/settings/preferences/:email - restore the active tab
pub async fn get_preference(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<PreferenceResponse>, ApiError> {
    let service = SettingsService::new(state.mongo.clone(), state.config.collections.clone());
    let preference = service
        .get_preference(&email)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(preference))
}

/// PUT /api/v1/settings/preferences/:email - persist the active tab
pub async fn put_preference(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
    AppJson(req): AppJson<UpdatePreferenceRequest>,
) -> Result<Json<PreferenceResponse>, ApiError> {
    let service = SettingsService::new(state.mongo.clone(), state.config.collections.clone());
    let preference = service
        .put_preference(&email, &req.active_tab)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(preference))
}

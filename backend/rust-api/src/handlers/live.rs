use axum::{extract::State, Json};
use std::sync::Arc;

use crate::models::progress::{ModuleCatalog, SessionProjection};
use crate::services::{live_progress, AppState};

/// GET /api/v1/live/sessions - full per-session projections for the live
/// monitor tab, newest update first. Every record in the progress slice is
/// shown here; the 10-minute recency filter applies only to the dashboard
/// activity list.
pub async fn live_sessions(State(state): State<Arc<AppState>>) -> Json<Vec<SessionProjection>> {
    let catalog = ModuleCatalog::default();

    let mut sessions: Vec<SessionProjection> = {
        let progress = state.snapshot.progress.read().await;
        progress
            .items
            .iter()
            .map(|record| live_progress::project_session(record, &catalog))
            .collect()
    };

    sessions.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));

    Json(sessions)
}

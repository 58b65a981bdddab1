use axum::{extract::State, Json};
use std::sync::Arc;

use crate::models::notification::DashboardNotification;
use crate::models::stats::{LiveSession, OverviewStats, PerformanceStats, SystemAlert};
use crate::services::AppState;

/// GET /api/v1/dashboard/overview - stat cards. Zeroed until the first
/// successful stats tick; never an error.
pub async fn overview(State(state): State<Arc<AppState>>) -> Json<OverviewStats> {
    let overview = state.snapshot.overview.read().await.clone();
    Json(overview.unwrap_or_default())
}

/// GET /api/v1/dashboard/performance
pub async fn performance(State(state): State<Arc<AppState>>) -> Json<PerformanceStats> {
    let performance = state.snapshot.performance.read().await.clone();
    Json(performance.unwrap_or_default())
}

/// GET /api/v1/dashboard/activity - sessions live within the recency window
pub async fn activity(State(state): State<Arc<AppState>>) -> Json<Vec<LiveSession>> {
    let live = state.snapshot.live_activity.read().await;
    Json(live.items.clone())
}

/// GET /api/v1/dashboard/alerts
pub async fn alerts(State(state): State<Arc<AppState>>) -> Json<Vec<SystemAlert>> {
    let alerts = state.snapshot.alerts.read().await;
    Json(alerts.clone())
}

/// GET /api/v1/dashboard/notifications - in-memory feed, newest first
pub async fn notifications(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<DashboardNotification>> {
    Json(state.notifications.list())
}

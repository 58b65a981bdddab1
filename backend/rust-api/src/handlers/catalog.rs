use axum::{extract::State, Json};
use std::sync::Arc;

use crate::models::result::ResultResponse;
use crate::models::test::TestSummary;
use crate::services::AppState;

/// GET /api/v1/tests - read-only listing from the polled snapshot
pub async fn list_tests(State(state): State<Arc<AppState>>) -> Json<Vec<TestSummary>> {
    let tests = state.snapshot.tests.read().await;
    Json(tests.items.iter().cloned().map(TestSummary::from).collect())
}

/// GET /api/v1/results - read-only listing from the polled snapshot
pub async fn list_results(State(state): State<Arc<AppState>>) -> Json<Vec<ResultResponse>> {
    let results = state.snapshot.results.read().await;
    Json(
        results
            .items
            .iter()
            .cloned()
            .map(ResultResponse::from)
            .collect(),
    )
}

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use base64::{engine::general_purpose, Engine as _};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

use examboard_api::{config::Config, create_router, services::AppState};

/// Router over a lazily-connected store. None of the asserted paths issue a
/// store call, so these run without a MongoDB instance.
async fn test_app() -> axum::Router {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::WARN)
        .try_init();

    let config = Config::load().expect("Failed to load test configuration");
    let mongo_client = mongodb::Client::with_uri_str(&config.mongo_uri)
        .await
        .expect("Failed to create MongoDB client");

    create_router(Arc::new(AppState::new(config, mongo_client)))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn metrics_endpoint_requires_basic_auth() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let credentials = general_purpose::STANDARD.encode(
        std::env::var("METRICS_AUTH").unwrap_or_else(|_| "admin:changeme".to_string()),
    );
    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .header("authorization", format!("Basic {}", credentials))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_route_is_404() {
    let app = test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_student_email_is_rejected_before_any_store_call() {
    let app = test_app().await;

    let payload = json!({
        "email": "not-an-email",
        "name": "Test Student",
        "password": "secret"
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/students")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("Validation error"));
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn empty_preference_tab_is_rejected() {
    let app = test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/v1/settings/preferences/admin@example.com")
                .header("content-type", "application/json")
                .body(Body::from(json!({ "active_tab": "" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_reports_dependency_map() {
    let app = test_app().await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    // healthy with a store, degraded without; both carry the dependency map
    assert!(
        response.status() == StatusCode::OK
            || response.status() == StatusCode::SERVICE_UNAVAILABLE
    );
    let body = body_json(response).await;
    assert_eq!(body["service"], "examboard-api");
    assert!(body["dependencies"]["mongodb"]["status"].is_string());
}

#[tokio::test]
async fn dashboard_slices_default_to_zeroed_data() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/dashboard/overview")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let overview = body_json(response).await;
    assert_eq!(overview["total_students"], 0);
    assert!(overview["refreshed_at"].is_null());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/live/sessions")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/colleges")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let colleges = body_json(response).await;
    assert_eq!(colleges["mode"], "table");
    assert_eq!(colleges["halted"], false);
    assert_eq!(colleges["colleges"], json!([]));
}

#[tokio::test]
async fn poller_registry_is_empty_until_spawned() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/pollers")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));

    // stop on an unknown poller is a 404, not a crash
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/pollers/students/stop")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

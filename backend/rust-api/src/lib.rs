#![allow(dead_code)]

use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use services::AppState;

/// CSP middleware adds Content-Security-Policy header to all responses
async fn csp_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    response.headers_mut().insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(
            "default-src 'self'; \
             script-src 'self' 'unsafe-inline'; \
             style-src 'self' 'unsafe-inline'; \
             img-src 'self' data: https:; \
             connect-src 'self'",
        ),
    );
    response
}

pub fn create_router(app_state: std::sync::Arc<services::AppState>) -> Router {
    // CORS for the dashboard SPA; locked to the configured origin when one is set
    let mut cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);
    cors = match app_state
        .config
        .cors_origin
        .as_deref()
        .and_then(|origin| origin.parse::<HeaderValue>().ok())
    {
        Some(origin) => cors.allow_origin(origin),
        None => cors.allow_origin(tower_http::cors::Any),
    };

    Router::new()
        // Public endpoints (no auth required)
        .route("/health", get(handlers::health_check))
        // Metrics endpoint with Basic Auth protection
        .route(
            "/metrics",
            get(handlers::metrics_handler)
                .layer(middleware::from_fn(handlers::metrics_auth_middleware)),
        )
        .nest("/api/v1/dashboard", dashboard_routes())
        .nest("/api/v1/live", live_routes())
        .nest("/api/v1/students", students_routes())
        .nest("/api/v1/colleges", colleges_routes())
        .nest("/api/v1/settings", settings_routes())
        .nest("/api/v1/pollers", pollers_routes())
        // Read-only catalog listings
        .route("/api/v1/tests", get(handlers::catalog::list_tests))
        .route("/api/v1/results", get(handlers::catalog::list_results))
        .with_state(app_state)
        .layer(middleware::from_fn(csp_middleware))
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn dashboard_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route("/overview", get(handlers::dashboard::overview))
        .route("/performance", get(handlers::dashboard::performance))
        .route("/activity", get(handlers::dashboard::activity))
        .route("/alerts", get(handlers::dashboard::alerts))
        .route("/notifications", get(handlers::dashboard::notifications))
}

fn live_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new().route("/sessions", get(handlers::live::live_sessions))
}

fn students_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route(
            "/",
            get(handlers::students::list_students).post(handlers::students::create_student),
        )
        .route(
            "/{id}",
            axum::routing::patch(handlers::students::update_student)
                .delete(handlers::students::delete_student),
        )
}

fn colleges_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route(
            "/",
            get(handlers::colleges::list_colleges).post(handlers::colleges::create_college),
        )
        .route("/retry", post(handlers::colleges::retry_colleges))
        .route("/{id}", axum::routing::delete(handlers::colleges::delete_college))
}

fn settings_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route("/credentials", post(handlers::settings::change_credentials))
        .route(
            "/preferences/{email}",
            get(handlers::settings::get_preference).put(handlers::settings::put_preference),
        )
}

fn pollers_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route("/", get(handlers::pollers::list_pollers))
        .route("/{name}/start", post(handlers::pollers::start_poller))
        .route("/{name}/stop", post(handlers::pollers::stop_poller))
}

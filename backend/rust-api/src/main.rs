#![allow(dead_code)]

use std::sync::Arc;

use examboard_api::{config::Config, create_router, services::pollers, services::AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "examboard_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ExamBoard admin dashboard API");

    // Load configuration
    let config = Config::load().expect("Failed to load configuration");
    tracing::info!(
        "Configuration loaded for environment: {:?}",
        std::env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string())
    );

    // Client construction is lazy; probe the connection but keep serving even
    // when the store is down — the dashboard shows stale/zeroed data instead.
    let mongo_client = mongodb::Client::with_uri_str(&config.mongo_uri)
        .await
        .expect("Failed to create MongoDB client");

    let app_state = Arc::new(AppState::new(config, mongo_client));

    match tokio::time::timeout(
        std::time::Duration::from_secs(5),
        app_state.mongo.run_command(mongodb::bson::doc! { "ping": 1 }),
    )
    .await
    {
        Ok(Ok(_)) => tracing::info!("MongoDB connected"),
        Ok(Err(e)) => tracing::warn!(error = %e, "MongoDB ping failed; starting with empty data"),
        Err(_) => tracing::warn!("MongoDB ping timed out; starting with empty data"),
    }

    // Initial load: the four primary collections fetched concurrently, every
    // outcome awaited; a failed fetch logs and leaves its slice empty.
    let (students, tests, results, progress) = tokio::join!(
        pollers::refresh_students(&app_state),
        pollers::refresh_tests(&app_state),
        pollers::refresh_results(&app_state),
        pollers::refresh_progress(&app_state),
    );
    for (domain, outcome) in [
        ("students", students),
        ("tests", tests),
        ("results", results),
        ("progress", progress),
    ] {
        if let Err(err) = outcome {
            tracing::warn!(domain, error = %err, "Initial load failed");
        }
    }

    pollers::spawn_pollers(&app_state);

    // Build router
    let app = create_router(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind("0.0.0.0:8090").await.unwrap();

    tracing::info!("Server listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::metrics::{HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION_SECONDS};

/// Collects request count and latency per method/path/status.
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = normalize_path(req.uri().path());

    let response = next.run(req).await;

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[&method, &path])
        .observe(duration);

    response
}

/// Collapse dynamic path segments so metric cardinality stays bounded.
/// Document ids (24 hex), UUIDs, numeric ids and emails all become
/// placeholders.
fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if is_object_id_like(segment) || is_uuid_like(segment) || is_numeric_id(segment) {
                "{id}"
            } else if segment.contains('@') {
                "{email}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Mongo ObjectId in hex: exactly 24 hex characters
fn is_object_id_like(s: &str) -> bool {
    s.len() == 24 && s.chars().all(|c| c.is_ascii_hexdigit())
}

fn is_uuid_like(s: &str) -> bool {
    s.len() == 36 && s.chars().all(|c| c.is_ascii_hexdigit() || c == '-')
}

fn is_numeric_id(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_dynamic_segments() {
        assert_eq!(
            normalize_path("/api/v1/students/64f1a2b3c4d5e6f7a8b9c0d1"),
            "/api/v1/students/{id}"
        );
        assert_eq!(
            normalize_path("/api/v1/students/550e8400-e29b-41d4-a716-446655440000"),
            "/api/v1/students/{id}"
        );
        assert_eq!(
            normalize_path("/api/v1/settings/preferences/admin@example.com"),
            "/api/v1/settings/preferences/{email}"
        );
        assert_eq!(normalize_path("/api/v1/colleges/123"), "/api/v1/colleges/{id}");
        assert_eq!(normalize_path("/health"), "/health");
    }

    #[test]
    fn object_id_detection() {
        assert!(is_object_id_like("64f1a2b3c4d5e6f7a8b9c0d1"));
        assert!(!is_object_id_like("not-an-object-id"));
        assert!(!is_object_id_like("64f1a2b3"));
    }
}

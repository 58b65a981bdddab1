use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, Encoder, HistogramVec,
    IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // Polling Metrics
    pub static ref POLL_TICKS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "poll_ticks_total",
        "Total number of dashboard poll ticks",
        &["poller", "status"]
    )
    .unwrap();

    // Business Metrics
    pub static ref LIVE_SESSIONS_ACTIVE: IntGauge = register_int_gauge!(
        "live_sessions_active",
        "Number of exam sessions currently counted as live"
    )
    .unwrap();

    pub static ref COLLEGE_FALLBACK_ACTIVE: IntGauge = register_int_gauge!(
        "college_fallback_active",
        "1 while the college directory is pinned to the derived fallback"
    )
    .unwrap();

    pub static ref CREDENTIAL_CHANGES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "credential_changes_total",
        "Total number of admin credential change attempts",
        &["status"]
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_render_as_text() {
        POLL_TICKS_TOTAL.with_label_values(&["students", "success"]).inc();
        let rendered = render_metrics().unwrap();
        assert!(rendered.contains("poll_ticks_total"));
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Stat-card numbers for the dashboard overview.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OverviewStats {
    pub total_students: u64,
    pub total_tests: u64,
    pub total_results: u64,
    pub total_colleges: u64,
    pub live_sessions: u64,
    pub refreshed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PerformanceStats {
    pub result_count: u64,
    pub average_percentage: f64,
    /// Share of results at or above the pass mark, 0..=100
    pub pass_rate: f64,
    pub completions_24h: u64,
    pub computed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Warning,
    Critical,
}

/// Derived system alert shown on the dashboard alert strip.
#[derive(Debug, Clone, Serialize)]
pub struct SystemAlert {
    pub severity: AlertSeverity,
    pub source: String,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

/// Row of the recent-activity list: a session that is both flagged live and
/// updated within the recency window.
#[derive(Debug, Clone, Serialize)]
pub struct LiveSession {
    pub student_name: String,
    pub student_email: String,
    pub test_title: String,
    pub status: String,
    pub last_updated: Option<DateTime<Utc>>,
    pub overall_percentage: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PollTaskStatus {
    pub name: String,
    pub interval_secs: u64,
    pub enabled: bool,
}

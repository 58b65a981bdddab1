//! In-memory dashboard state. Each polled domain owns one slice that is
//! replaced wholesale on every successful tick — last fetch wins, no deltas.
//! On failure the previous (stale) items stay in place.

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::models::progress::ExamProgress;
use crate::models::result::ExamResult;
use crate::models::stats::{LiveSession, OverviewStats, PerformanceStats, SystemAlert};
use crate::models::student::Student;
use crate::models::test::ExamTest;

#[derive(Debug)]
pub struct DomainSlice<T> {
    pub items: Vec<T>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
}

impl<T> Default for DomainSlice<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            fetched_at: None,
            consecutive_failures: 0,
        }
    }
}

impl<T> DomainSlice<T> {
    pub fn replace(&mut self, items: Vec<T>) {
        self.items = items;
        self.fetched_at = Some(Utc::now());
        self.consecutive_failures = 0;
    }

    /// Stale items stay; only the failure streak is recorded.
    pub fn record_failure(&mut self) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
    }

    pub fn age_secs(&self, now: DateTime<Utc>) -> Option<i64> {
        self.fetched_at
            .map(|fetched| now.signed_duration_since(fetched).num_seconds())
    }
}

#[derive(Default)]
pub struct DashboardSnapshot {
    pub students: RwLock<DomainSlice<Student>>,
    pub tests: RwLock<DomainSlice<ExamTest>>,
    pub results: RwLock<DomainSlice<ExamResult>>,
    pub progress: RwLock<DomainSlice<ExamProgress>>,
    pub live_activity: RwLock<DomainSlice<LiveSession>>,
    pub alerts: RwLock<Vec<SystemAlert>>,
    pub overview: RwLock<Option<OverviewStats>>,
    pub performance: RwLock<Option<PerformanceStats>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_resets_failure_streak() {
        let mut slice: DomainSlice<u32> = DomainSlice::default();
        slice.record_failure();
        slice.record_failure();
        assert_eq!(slice.consecutive_failures, 2);
        assert!(slice.fetched_at.is_none());

        slice.replace(vec![1, 2, 3]);
        assert_eq!(slice.items, vec![1, 2, 3]);
        assert_eq!(slice.consecutive_failures, 0);
        assert!(slice.fetched_at.is_some());
    }

    #[test]
    fn failure_keeps_stale_items() {
        let mut slice: DomainSlice<u32> = DomainSlice::default();
        slice.replace(vec![7]);
        slice.record_failure();
        assert_eq!(slice.items, vec![7]);
    }
}

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use mongodb::bson::{doc, Document};
use mongodb::Database;

use crate::config::CollectionNames;
use crate::models::result::ExamResult;
use crate::models::stats::{AlertSeverity, OverviewStats, PerformanceStats, SystemAlert};
use crate::utils::retry::{is_transient_mongo_error, retry_transient, RetryPolicy};
use crate::utils::time::chrono_to_bson;

/// Results at or above this percentage count as passes.
const PASS_MARK_PERCENT: f64 = 40.0;

/// A domain slice older than this many multiples of its poll interval is
/// considered stale for alerting.
const STALE_INTERVAL_FACTOR: i64 = 3;

/// Failure streak that escalates a domain alert to critical.
const FAILURE_STREAK_THRESHOLD: u32 = 3;

pub struct StatsService {
    mongo: Database,
    collections: CollectionNames,
}

impl StatsService {
    pub fn new(mongo: Database, collections: CollectionNames) -> Self {
        Self { mongo, collections }
    }

    /// Stat-card counts straight from the store. This refresh is the one
    /// operation wrapped in the transient-retry policy; a connection blip
    /// gets a couple of backed-off attempts before the tick gives up.
    pub async fn gather_overview(
        &self,
        live_sessions: u64,
        total_colleges: u64,
    ) -> Result<OverviewStats> {
        let (total_students, total_tests, total_results) = retry_transient(
            RetryPolicy::default(),
            is_transient_mongo_error,
            || self.count_primary_collections(),
        )
        .await
        .context("Failed to count collections for overview")?;

        Ok(OverviewStats {
            total_students,
            total_tests,
            total_results,
            total_colleges,
            live_sessions,
            refreshed_at: Some(Utc::now()),
        })
    }

    async fn count_primary_collections(&self) -> Result<(u64, u64, u64), mongodb::error::Error> {
        let students = self
            .mongo
            .collection::<Document>(&self.collections.users)
            .count_documents(doc! { "role": "student" })
            .await?;
        let tests = self
            .mongo
            .collection::<Document>(&self.collections.tests)
            .estimated_document_count()
            .await?;
        let results = self
            .mongo
            .collection::<Document>(&self.collections.results)
            .estimated_document_count()
            .await?;
        Ok((students, tests, results))
    }

    /// 24h completion count queried store-side so it matches the stat card
    /// even when the snapshot slice is stale.
    pub async fn count_recent_completions(&self, now: DateTime<Utc>) -> Result<u64> {
        let since = now - Duration::hours(24);
        self.mongo
            .collection::<Document>(&self.collections.results)
            .count_documents(doc! { "completedAt": { "$gte": chrono_to_bson(since) } })
            .await
            .context("Failed to count recent completions")
    }
}

/// Performance aggregates over the results slice. Pure; zeroed stats for an
/// empty slice.
pub fn performance_from_results(
    results: &[ExamResult],
    completions_24h: u64,
    now: DateTime<Utc>,
) -> PerformanceStats {
    if results.is_empty() {
        return PerformanceStats {
            computed_at: Some(now),
            completions_24h,
            ..Default::default()
        };
    }

    let count = results.len() as f64;
    let average_percentage = results.iter().map(|r| r.percentage).sum::<f64>() / count;
    let passes = results
        .iter()
        .filter(|r| r.percentage >= PASS_MARK_PERCENT)
        .count() as f64;

    PerformanceStats {
        result_count: results.len() as u64,
        average_percentage: (average_percentage * 10.0).round() / 10.0,
        pass_rate: (100.0 * passes / count * 10.0).round() / 10.0,
        completions_24h,
        computed_at: Some(now),
    }
}

/// Health input for one polled domain, sampled from its snapshot slice.
#[derive(Debug, Clone)]
pub struct DomainHealth {
    pub name: &'static str,
    pub interval_secs: u64,
    pub age_secs: Option<i64>,
    pub consecutive_failures: u32,
}

/// Derive the alert strip from snapshot health. Pure.
pub fn derive_alerts(
    domains: &[DomainHealth],
    college_fallback: bool,
    now: DateTime<Utc>,
) -> Vec<SystemAlert> {
    let mut alerts = Vec::new();

    for domain in domains {
        if domain.consecutive_failures >= FAILURE_STREAK_THRESHOLD {
            alerts.push(SystemAlert {
                severity: AlertSeverity::Critical,
                source: domain.name.to_string(),
                message: format!(
                    "{} refresh has failed {} times in a row",
                    domain.name, domain.consecutive_failures
                ),
                raised_at: now,
            });
            continue;
        }

        let stale_after = STALE_INTERVAL_FACTOR * domain.interval_secs as i64;
        match domain.age_secs {
            Some(age) if age > stale_after => alerts.push(SystemAlert {
                severity: AlertSeverity::Warning,
                source: domain.name.to_string(),
                message: format!("{} data is {}s old", domain.name, age),
                raised_at: now,
            }),
            // a slice that never loaded is only worth an alert once failures accumulate
            _ => {}
        }
    }

    if college_fallback {
        alerts.push(SystemAlert {
            severity: AlertSeverity::Warning,
            source: "colleges".to_string(),
            message: "College collection unavailable; showing list derived from student records"
                .to_string(),
            raised_at: now,
        });
    }

    alerts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(percentage: f64) -> ExamResult {
        ExamResult {
            id: None,
            student_email: "s@example.com".to_string(),
            student_name: None,
            test_title: "Placement".to_string(),
            score: 0.0,
            percentage,
            completed_at: None,
        }
    }

    #[test]
    fn performance_averages_and_pass_rate() {
        let now = Utc::now();
        let results = vec![result(80.0), result(30.0), result(55.0), result(40.0)];
        let stats = performance_from_results(&results, 2, now);

        assert_eq!(stats.result_count, 4);
        assert_eq!(stats.average_percentage, 51.3); // (80+30+55+40)/4 = 51.25
        assert_eq!(stats.pass_rate, 75.0); // 3 of 4 at or above the pass mark
        assert_eq!(stats.completions_24h, 2);
    }

    #[test]
    fn empty_results_zero_out() {
        let stats = performance_from_results(&[], 0, Utc::now());
        assert_eq!(stats.result_count, 0);
        assert_eq!(stats.average_percentage, 0.0);
        assert_eq!(stats.pass_rate, 0.0);
    }

    #[test]
    fn alerts_flag_stale_and_failing_domains() {
        let now = Utc::now();
        let domains = vec![
            DomainHealth {
                name: "students",
                interval_secs: 60,
                age_secs: Some(30),
                consecutive_failures: 0,
            },
            DomainHealth {
                name: "progress",
                interval_secs: 5,
                age_secs: Some(60),
                consecutive_failures: 0,
            },
            DomainHealth {
                name: "results",
                interval_secs: 30,
                age_secs: Some(10),
                consecutive_failures: 4,
            },
            DomainHealth {
                name: "tests",
                interval_secs: 60,
                age_secs: None,
                consecutive_failures: 0,
            },
        ];

        let alerts = derive_alerts(&domains, true, now);

        assert_eq!(alerts.len(), 3);
        assert_eq!(alerts[0].source, "progress");
        assert_eq!(alerts[0].severity, AlertSeverity::Warning);
        assert_eq!(alerts[1].source, "results");
        assert_eq!(alerts[1].severity, AlertSeverity::Critical);
        assert_eq!(alerts[2].source, "colleges");
    }

    #[test]
    fn quiet_snapshot_produces_no_alerts() {
        let domains = vec![DomainHealth {
            name: "students",
            interval_secs: 60,
            age_secs: Some(5),
            consecutive_failures: 1,
        }];
        assert!(derive_alerts(&domains, false, Utc::now()).is_empty());
    }
}

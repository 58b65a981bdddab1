//! Poller wiring: one refresh function per dashboard data domain, and the
//! spawn routine that hands each to its own `PollTask`. Refreshes replace
//! their snapshot slice wholesale; on failure the stale slice stays and only
//! the failure streak is recorded.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::metrics::{COLLEGE_FALLBACK_ACTIVE, LIVE_SESSIONS_ACTIVE};
use crate::models::notification::NotificationLevel;
use crate::models::progress::ModuleCatalog;
use crate::services::catalog_service::CatalogService;
use crate::services::college_service::RefreshOutcome;
use crate::services::live_progress;
use crate::services::poll::PollTask;
use crate::services::snapshot::DomainSlice;
use crate::services::stats_service::{
    derive_alerts, performance_from_results, DomainHealth, StatsService,
};
use crate::services::student_service::StudentService;
use crate::services::AppState;

/// Notifications older than this are pruned from the feed.
const NOTIFICATION_MAX_AGE_HOURS: i64 = 24;

pub async fn refresh_students(state: &AppState) -> Result<()> {
    let service = StudentService::new(state.mongo.clone(), state.config.collections.clone());
    apply(&state.snapshot.students, service.scan_all().await).await
}

pub async fn refresh_tests(state: &AppState) -> Result<()> {
    let service = CatalogService::new(state.mongo.clone(), state.config.collections.clone());
    apply(&state.snapshot.tests, service.list_tests().await).await
}

pub async fn refresh_results(state: &AppState) -> Result<()> {
    let service = CatalogService::new(state.mongo.clone(), state.config.collections.clone());
    apply(&state.snapshot.results, service.list_results().await).await
}

pub async fn refresh_progress(state: &AppState) -> Result<()> {
    let service = CatalogService::new(state.mongo.clone(), state.config.collections.clone());
    apply(&state.snapshot.progress, service.list_progress().await).await
}

/// Live activity is its own scan rather than a view over the progress slice,
/// so the two fetches race independently — last response wins either slice.
pub async fn refresh_live_activity(state: &AppState) -> Result<()> {
    let service = CatalogService::new(state.mongo.clone(), state.config.collections.clone());
    match service.list_progress().await {
        Ok(records) => {
            let sessions =
                live_progress::recent_sessions(&records, &ModuleCatalog::default(), Utc::now());
            LIVE_SESSIONS_ACTIVE.set(sessions.len() as i64);
            state.snapshot.live_activity.write().await.replace(sessions);
            Ok(())
        }
        Err(err) => {
            state.snapshot.live_activity.write().await.record_failure();
            Err(err)
        }
    }
}

pub async fn refresh_colleges(state: &AppState) -> Result<()> {
    let student_colleges = student_college_names(state).await;
    let outcome = state
        .colleges
        .refresh(&student_colleges)
        .await
        .map_err(anyhow::Error::from)?;

    match outcome {
        RefreshOutcome::Table => COLLEGE_FALLBACK_ACTIVE.set(0),
        RefreshOutcome::FallbackPinned => {
            COLLEGE_FALLBACK_ACTIVE.set(1);
            state.notifications.push(
                NotificationLevel::Warning,
                "College list switched to derived mode: collection missing. Use retry to restore.",
            );
        }
        RefreshOutcome::Derived => COLLEGE_FALLBACK_ACTIVE.set(1),
    }

    Ok(())
}

/// Overview cards and performance aggregates share one tick; the overview
/// counts are the single operation behind the transient-retry policy.
pub async fn refresh_performance(state: &AppState) -> Result<()> {
    let service = StatsService::new(state.mongo.clone(), state.config.collections.clone());
    let now = Utc::now();

    let live_sessions = state.snapshot.live_activity.read().await.items.len() as u64;
    let total_colleges = state.colleges.college_count().await;
    let overview = service.gather_overview(live_sessions, total_colleges).await?;
    *state.snapshot.overview.write().await = Some(overview);

    let completions_24h = match service.count_recent_completions(now).await {
        Ok(count) => count,
        Err(err) => {
            tracing::warn!(error = %err, "24h completion count failed; showing 0");
            0
        }
    };
    let results = state.snapshot.results.read().await;
    let performance = performance_from_results(&results.items, completions_24h, now);
    drop(results);
    *state.snapshot.performance.write().await = Some(performance);

    Ok(())
}

pub async fn refresh_alerts(state: &AppState) -> Result<()> {
    let now = Utc::now();
    let poll = &state.config.poll;

    let mut domains = Vec::new();
    {
        let students = state.snapshot.students.read().await;
        domains.push(DomainHealth {
            name: "students",
            interval_secs: poll.students_secs,
            age_secs: students.age_secs(now),
            consecutive_failures: students.consecutive_failures,
        });
    }
    {
        let tests = state.snapshot.tests.read().await;
        domains.push(DomainHealth {
            name: "tests",
            interval_secs: poll.tests_secs,
            age_secs: tests.age_secs(now),
            consecutive_failures: tests.consecutive_failures,
        });
    }
    {
        let results = state.snapshot.results.read().await;
        domains.push(DomainHealth {
            name: "results",
            interval_secs: poll.results_secs,
            age_secs: results.age_secs(now),
            consecutive_failures: results.consecutive_failures,
        });
    }
    {
        let progress = state.snapshot.progress.read().await;
        domains.push(DomainHealth {
            name: "progress",
            interval_secs: poll.progress_secs,
            age_secs: progress.age_secs(now),
            consecutive_failures: progress.consecutive_failures,
        });
    }
    {
        let live = state.snapshot.live_activity.read().await;
        domains.push(DomainHealth {
            name: "live-activity",
            interval_secs: poll.live_activity_secs,
            age_secs: live.age_secs(now),
            consecutive_failures: live.consecutive_failures,
        });
    }

    let alerts = derive_alerts(&domains, state.colleges.is_halted(), now);
    *state.snapshot.alerts.write().await = alerts;

    Ok(())
}

pub async fn prune_notifications(state: &AppState) -> Result<()> {
    state.notifications.prune_older_than(
        chrono::Duration::hours(NOTIFICATION_MAX_AGE_HOURS),
        Utc::now(),
    );
    Ok(())
}

/// One entry per student record, duplicates included, for college counting
/// and the derived fallback.
pub async fn student_college_names(state: &AppState) -> Vec<String> {
    state
        .snapshot
        .students
        .read()
        .await
        .items
        .iter()
        .filter_map(|student| student.college.clone())
        .collect()
}

/// Spawn every domain poller and register it on the state.
pub fn spawn_pollers(state: &Arc<AppState>) {
    let poll = state.config.poll.clone();

    spawn_domain(state, "students", poll.students_secs, |s| async move {
        refresh_students(&s).await
    });
    spawn_domain(state, "tests", poll.tests_secs, |s| async move {
        refresh_tests(&s).await
    });
    spawn_domain(state, "results", poll.results_secs, |s| async move {
        refresh_results(&s).await
    });
    spawn_domain(state, "progress", poll.progress_secs, |s| async move {
        refresh_progress(&s).await
    });
    spawn_domain(
        state,
        "live-activity",
        poll.live_activity_secs,
        |s| async move { refresh_live_activity(&s).await },
    );
    spawn_domain(state, "colleges", poll.colleges_secs, |s| async move {
        refresh_colleges(&s).await
    });
    spawn_domain(state, "performance", poll.performance_secs, |s| async move {
        refresh_performance(&s).await
    });
    spawn_domain(state, "alerts", poll.alerts_secs, |s| async move {
        refresh_alerts(&s).await
    });
    spawn_domain(
        state,
        "notifications",
        poll.notifications_secs,
        |s| async move { prune_notifications(&s).await },
    );

    tracing::info!("Dashboard pollers spawned");
}

fn spawn_domain<F, Fut>(state: &Arc<AppState>, name: &'static str, secs: u64, refresh: F)
where
    F: Fn(Arc<AppState>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let tick_state = state.clone();
    let task = PollTask::spawn(name, Duration::from_secs(secs), move || {
        refresh(tick_state.clone())
    });
    state.register_poller(task);
}

async fn apply<T>(
    slice: &RwLock<DomainSlice<T>>,
    result: Result<Vec<T>>,
) -> Result<()> {
    match result {
        Ok(items) => {
            slice.write().await.replace(items);
            Ok(())
        }
        Err(err) => {
            slice.write().await.record_failure();
            Err(err)
        }
    }
}

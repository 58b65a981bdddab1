//! Explicit polling-task objects. Every dashboard data domain owns one
//! `PollTask` holding its interval loop and enabled flag; start/stop are the
//! only mutators. A disabled task keeps its timer but skips ticks, and an
//! in-flight tick is never aborted.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::metrics::POLL_TICKS_TOTAL;
use crate::models::stats::PollTaskStatus;

pub struct PollTask {
    name: &'static str,
    interval: Duration,
    enabled: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl PollTask {
    /// Spawn the interval loop. Tick failures are logged and counted, never
    /// surfaced: the next interval retries unconditionally.
    pub fn spawn<F, Fut>(name: &'static str, interval: Duration, tick: F) -> Arc<Self>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let enabled = Arc::new(AtomicBool::new(true));
        let task = Arc::new(Self {
            name,
            interval,
            enabled: enabled.clone(),
            handle: Mutex::new(None),
        });

        let loop_enabled = enabled;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !loop_enabled.load(Ordering::Relaxed) {
                    continue;
                }
                match tick().await {
                    Ok(()) => {
                        POLL_TICKS_TOTAL.with_label_values(&[name, "success"]).inc();
                    }
                    Err(err) => {
                        POLL_TICKS_TOTAL.with_label_values(&[name, "error"]).inc();
                        tracing::warn!(poller = name, error = %err, "Poll tick failed");
                    }
                }
            }
        });
        *task.handle.lock().expect("poll handle lock") = Some(handle);

        task
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn start(&self) {
        self.enabled.store(true, Ordering::Relaxed);
        tracing::info!(poller = self.name, "Poller started");
    }

    pub fn stop(&self) {
        self.enabled.store(false, Ordering::Relaxed);
        tracing::info!(poller = self.name, "Poller stopped");
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn status(&self) -> PollTaskStatus {
        PollTaskStatus {
            name: self.name.to_string(),
            interval_secs: self.interval.as_secs(),
            enabled: self.is_enabled(),
        }
    }
}

impl Drop for PollTask {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.handle.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }
}

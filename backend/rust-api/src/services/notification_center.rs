use std::collections::VecDeque;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::models::notification::{DashboardNotification, NotificationLevel};

/// How many notifications the feed keeps before dropping the oldest.
const FEED_CAP: usize = 100;

/// Capped in-memory notification feed. Nothing here survives a restart;
/// this is the only audit surface the dashboard has.
#[derive(Default)]
pub struct NotificationCenter {
    entries: RwLock<VecDeque<DashboardNotification>>,
}

impl NotificationCenter {
    pub fn push(&self, level: NotificationLevel, message: impl Into<String>) {
        let notification = DashboardNotification {
            id: Uuid::new_v4().to_string(),
            level,
            message: message.into(),
            created_at: Utc::now(),
        };

        let mut entries = self.entries.write().expect("notification lock");
        entries.push_front(notification);
        while entries.len() > FEED_CAP {
            entries.pop_back();
        }
    }

    /// Newest first.
    pub fn list(&self) -> Vec<DashboardNotification> {
        self.entries
            .read()
            .expect("notification lock")
            .iter()
            .cloned()
            .collect()
    }

    pub fn prune_older_than(&self, max_age: Duration, now: DateTime<Utc>) {
        let mut entries = self.entries.write().expect("notification lock");
        entries.retain(|entry| now.signed_duration_since(entry.created_at) <= max_age);
    }
}

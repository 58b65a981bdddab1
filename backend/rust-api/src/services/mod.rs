use std::sync::Arc;

use mongodb::{Client as MongoClient, Database};

use crate::config::Config;
use crate::models::stats::PollTaskStatus;

use self::college_service::{CollegeDirectory, MongoCollegeSource};
use self::notification_center::NotificationCenter;
use self::poll::PollTask;
use self::snapshot::DashboardSnapshot;

pub struct AppState {
    pub config: Config,
    pub mongo: Database,
    pub snapshot: DashboardSnapshot,
    pub notifications: NotificationCenter,
    pub colleges: CollegeDirectory,
    pub start_time: std::time::Instant,
    pollers: std::sync::RwLock<Vec<Arc<PollTask>>>,
}

impl AppState {
    pub fn new(config: Config, mongo_client: MongoClient) -> Self {
        let mongo = mongo_client.database(&config.mongo_database);
        let college_source =
            MongoCollegeSource::new(mongo.clone(), config.collections.colleges.clone());

        Self {
            config,
            mongo,
            snapshot: DashboardSnapshot::default(),
            notifications: NotificationCenter::default(),
            colleges: CollegeDirectory::new(Arc::new(college_source)),
            start_time: std::time::Instant::now(),
            pollers: std::sync::RwLock::new(Vec::new()),
        }
    }

    pub fn register_poller(&self, task: Arc<PollTask>) {
        self.pollers.write().expect("poller registry lock").push(task);
    }

    pub fn poller(&self, name: &str) -> Option<Arc<PollTask>> {
        self.pollers
            .read()
            .expect("poller registry lock")
            .iter()
            .find(|task| task.name() == name)
            .cloned()
    }

    pub fn poller_statuses(&self) -> Vec<PollTaskStatus> {
        self.pollers
            .read()
            .expect("poller registry lock")
            .iter()
            .map(|task| task.status())
            .collect()
    }
}

pub mod catalog_service;
pub mod college_service;
pub mod live_progress;
pub mod notification_center;
pub mod poll;
pub mod pollers;
pub mod settings_service;
pub mod snapshot;
pub mod stats_service;
pub mod student_service;

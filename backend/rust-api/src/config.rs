use serde::Deserialize;
use std::env;

/// Logical table names in the document store. Every store access goes through
/// these so a deployment can remap collections without code changes.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionNames {
    pub users: String,
    pub tests: String,
    pub results: String,
    pub exam_progress: String,
    pub colleges: String,
    pub preferences: String,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            users: "users".to_string(),
            tests: "tests".to_string(),
            results: "results".to_string(),
            exam_progress: "exam_progress".to_string(),
            colleges: "colleges".to_string(),
            preferences: "dashboard_preferences".to_string(),
        }
    }
}

/// Refresh cadence per dashboard data domain, in seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct PollIntervals {
    pub progress_secs: u64,
    pub live_activity_secs: u64,
    pub students_secs: u64,
    pub tests_secs: u64,
    pub results_secs: u64,
    pub colleges_secs: u64,
    pub alerts_secs: u64,
    pub notifications_secs: u64,
    pub performance_secs: u64,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            progress_secs: 5,
            live_activity_secs: 10,
            students_secs: 60,
            tests_secs: 60,
            results_secs: 30,
            colleges_secs: 45,
            alerts_secs: 20,
            notifications_secs: 30,
            performance_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub mongo_uri: String,
    pub mongo_database: String,
    pub cors_origin: Option<String>,
    pub collections: CollectionNames,
    pub poll: PollIntervals,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let config_builder = config::Config::builder()
            .add_source(
                config::File::with_name(&format!("config/{}", env)).required(false), // Allow missing config file, fallback to ENV
            )
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        let settings = config_builder.build()?;

        let mongo_uri = settings
            .get_string("database.mongo_uri")
            .or_else(|_| env::var("MONGO_URI"))
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

        let mongo_database = settings
            .get_string("database.mongo_database")
            .or_else(|_| env::var("MONGO_DATABASE"))
            .unwrap_or_else(|_| "examboard".to_string());

        let cors_origin = settings
            .get_string("http.cors_origin")
            .ok()
            .or_else(|| env::var("CORS_ORIGIN").ok());

        let defaults = CollectionNames::default();
        let collections = CollectionNames {
            users: table_name(&settings, "users", &defaults.users),
            tests: table_name(&settings, "tests", &defaults.tests),
            results: table_name(&settings, "results", &defaults.results),
            exam_progress: table_name(&settings, "exam_progress", &defaults.exam_progress),
            colleges: table_name(&settings, "colleges", &defaults.colleges),
            preferences: table_name(&settings, "preferences", &defaults.preferences),
        };

        let default_poll = PollIntervals::default();
        let poll = PollIntervals {
            progress_secs: interval_secs(&settings, "progress_secs", default_poll.progress_secs),
            live_activity_secs: interval_secs(
                &settings,
                "live_activity_secs",
                default_poll.live_activity_secs,
            ),
            students_secs: interval_secs(&settings, "students_secs", default_poll.students_secs),
            tests_secs: interval_secs(&settings, "tests_secs", default_poll.tests_secs),
            results_secs: interval_secs(&settings, "results_secs", default_poll.results_secs),
            colleges_secs: interval_secs(&settings, "colleges_secs", default_poll.colleges_secs),
            alerts_secs: interval_secs(&settings, "alerts_secs", default_poll.alerts_secs),
            notifications_secs: interval_secs(
                &settings,
                "notifications_secs",
                default_poll.notifications_secs,
            ),
            performance_secs: interval_secs(
                &settings,
                "performance_secs",
                default_poll.performance_secs,
            ),
        };

        Ok(Config {
            mongo_uri,
            mongo_database,
            cors_origin,
            collections,
            poll,
        })
    }
}

fn table_name(settings: &config::Config, key: &str, default: &str) -> String {
    settings
        .get_string(&format!("collections.{}", key))
        .unwrap_or_else(|_| default.to_string())
}

fn interval_secs(settings: &config::Config, key: &str, default: u64) -> u64 {
    settings
        .get_int(&format!("poll.{}", key))
        .ok()
        .and_then(|v| u64::try_from(v).ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_domain() {
        let poll = PollIntervals::default();
        // All cadences sit inside the 1s..120s window the dashboard expects
        for secs in [
            poll.progress_secs,
            poll.live_activity_secs,
            poll.students_secs,
            poll.tests_secs,
            poll.results_secs,
            poll.colleges_secs,
            poll.alerts_secs,
            poll.notifications_secs,
            poll.performance_secs,
        ] {
            assert!((1..=120).contains(&secs));
        }
    }

    #[test]
    fn default_collection_names() {
        let names = CollectionNames::default();
        assert_eq!(names.users, "users");
        assert_eq!(names.exam_progress, "exam_progress");
        assert_eq!(names.preferences, "dashboard_preferences");
    }
}

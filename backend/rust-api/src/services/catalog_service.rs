use anyhow::{Context, Result};
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::Database;

use crate::config::CollectionNames;
use crate::models::progress::ExamProgress;
use crate::models::result::ExamResult;
use crate::models::test::ExamTest;

/// Read-only access to the exam catalog collections the dashboard polls but
/// never writes: tests, results and the per-session progress records.
/// Scans assume the full result set comes back in one page.
pub struct CatalogService {
    mongo: Database,
    collections: CollectionNames,
}

impl CatalogService {
    pub fn new(mongo: Database, collections: CollectionNames) -> Self {
        Self { mongo, collections }
    }

    pub async fn list_tests(&self) -> Result<Vec<ExamTest>> {
        let cursor = self
            .mongo
            .collection::<ExamTest>(&self.collections.tests)
            .find(doc! {})
            .await
            .context("Failed to scan tests")?;
        cursor.try_collect().await.context("Failed to collect tests")
    }

    pub async fn list_results(&self) -> Result<Vec<ExamResult>> {
        let cursor = self
            .mongo
            .collection::<ExamResult>(&self.collections.results)
            .find(doc! {})
            .await
            .context("Failed to scan results")?;
        cursor
            .try_collect()
            .await
            .context("Failed to collect results")
    }

    pub async fn list_progress(&self) -> Result<Vec<ExamProgress>> {
        let cursor = self
            .mongo
            .collection::<ExamProgress>(&self.collections.exam_progress)
            .find(doc! {})
            .await
            .context("Failed to scan exam progress")?;
        cursor
            .try_collect()
            .await
            .context("Failed to collect exam progress")
    }
}

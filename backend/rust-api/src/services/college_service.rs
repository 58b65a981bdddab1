//! College directory. Colleges normally live in their own collection, but a
//! deployment without it gets a non-persisted view derived from student
//! records. Once the collection is confirmed missing the directory pins
//! itself to derived mode and stops touching the collection until the
//! explicit retry action resets it — the one circuit breaker in the system.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::Database;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::college::{College, CollegeDirectoryResponse, CollegeMode, CollegeView};

#[derive(Debug, Error)]
pub enum StoreError {
    /// The collection is absent (or the server reported NamespaceNotFound)
    #[error("collection not found: {0}")]
    NotFound(String),
    /// Writes rejected while the breaker pins derived mode
    #[error("college collection unavailable; derived mode active")]
    Halted,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[async_trait]
pub trait CollegeSource: Send + Sync {
    async fn scan(&self) -> Result<Vec<College>, StoreError>;
    async fn insert(&self, name: &str) -> Result<College, StoreError>;
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;
}

pub struct MongoCollegeSource {
    mongo: Database,
    collection: String,
}

impl MongoCollegeSource {
    pub fn new(mongo: Database, collection: String) -> Self {
        Self { mongo, collection }
    }
}

#[async_trait]
impl CollegeSource for MongoCollegeSource {
    async fn scan(&self) -> Result<Vec<College>, StoreError> {
        // A find against a missing collection is silently empty, so absence
        // has to be confirmed explicitly for the not-found class to exist.
        let names = self.mongo.list_collection_names().await.map_err(|e| {
            StoreError::Other(anyhow::Error::new(e).context("Failed to list collections"))
        })?;
        if !names.iter().any(|name| name == &self.collection) {
            return Err(StoreError::NotFound(self.collection.clone()));
        }

        let cursor = self
            .mongo
            .collection::<College>(&self.collection)
            .find(doc! {})
            .await
            .map_err(|e| classify(e, &self.collection))?;
        cursor
            .try_collect()
            .await
            .map_err(|e| classify(e, &self.collection))
    }

    async fn insert(&self, name: &str) -> Result<College, StoreError> {
        let collection = self.mongo.collection::<College>(&self.collection);
        let mut college = College {
            id: None,
            name: name.to_string(),
            created_at: Some(Utc::now()),
        };
        let inserted = collection
            .insert_one(&college)
            .await
            .map_err(|e| classify(e, &self.collection))?;
        college.id = inserted.inserted_id.as_object_id();
        Ok(college)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let object_id = ObjectId::parse_str(id)
            .map_err(|_| StoreError::Other(anyhow::anyhow!("Invalid college ID format")))?;
        let result = self
            .mongo
            .collection::<College>(&self.collection)
            .delete_one(doc! { "_id": object_id })
            .await
            .map_err(|e| classify(e, &self.collection))?;
        Ok(result.deleted_count > 0)
    }
}

/// Server-side NamespaceNotFound belongs to the same not-found class as a
/// locally confirmed missing collection.
fn classify(err: mongodb::error::Error, collection: &str) -> StoreError {
    if let mongodb::error::ErrorKind::Command(ref command_err) = *err.kind {
        if command_err.code == 26 {
            return StoreError::NotFound(collection.to_string());
        }
    }
    StoreError::Other(anyhow::Error::new(err).context("College collection query failed"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Collection scan succeeded
    Table,
    /// Not-found observed this tick; the breaker is now pinned
    FallbackPinned,
    /// Breaker already pinned; view rebuilt from student records only
    Derived,
}

struct ViewState {
    mode: CollegeMode,
    refreshed_at: Option<DateTime<Utc>>,
    colleges: Vec<CollegeView>,
}

pub struct CollegeDirectory {
    source: Arc<dyn CollegeSource>,
    halted: AtomicBool,
    view: RwLock<ViewState>,
}

impl CollegeDirectory {
    pub fn new(source: Arc<dyn CollegeSource>) -> Self {
        Self {
            source,
            halted: AtomicBool::new(false),
            view: RwLock::new(ViewState {
                mode: CollegeMode::Table,
                refreshed_at: None,
                colleges: Vec::new(),
            }),
        }
    }

    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::Relaxed)
    }

    /// Refresh the directory view. `student_colleges` is one entry per
    /// student record (duplicates expected), used for per-college counts and
    /// for the derived fallback.
    pub async fn refresh(
        &self,
        student_colleges: &[String],
    ) -> Result<RefreshOutcome, StoreError> {
        if self.is_halted() {
            self.apply_derived(student_colleges).await;
            return Ok(RefreshOutcome::Derived);
        }

        match self.source.scan().await {
            Ok(colleges) => {
                self.apply_table(colleges, student_colleges).await;
                Ok(RefreshOutcome::Table)
            }
            Err(StoreError::NotFound(name)) => {
                self.halted.store(true, Ordering::Relaxed);
                tracing::warn!(
                    collection = %name,
                    "College collection missing; pinning derived fallback until retry"
                );
                self.apply_derived(student_colleges).await;
                Ok(RefreshOutcome::FallbackPinned)
            }
            // stale view stays in place on any other failure
            Err(other) => Err(other),
        }
    }

    /// The only way out of derived mode: clear the flag and refresh now.
    pub async fn retry(&self, student_colleges: &[String]) -> Result<RefreshOutcome, StoreError> {
        self.halted.store(false, Ordering::Relaxed);
        tracing::info!("College directory retry requested");
        self.refresh(student_colleges).await
    }

    pub async fn create(&self, name: &str) -> Result<College, StoreError> {
        if self.is_halted() {
            return Err(StoreError::Halted);
        }
        self.source.insert(name).await
    }

    pub async fn remove(&self, id: &str) -> Result<bool, StoreError> {
        if self.is_halted() {
            return Err(StoreError::Halted);
        }
        self.source.delete(id).await
    }

    pub async fn response(&self) -> CollegeDirectoryResponse {
        let view = self.view.read().await;
        CollegeDirectoryResponse {
            mode: view.mode,
            halted: self.is_halted(),
            refreshed_at: view.refreshed_at,
            colleges: view.colleges.clone(),
        }
    }

    pub async fn college_count(&self) -> u64 {
        self.view.read().await.colleges.len() as u64
    }

    async fn apply_table(&self, colleges: Vec<College>, student_colleges: &[String]) {
        let counts = count_by_name(student_colleges);
        let views = colleges
            .into_iter()
            .map(|college| {
                let student_count = counts.get(&college.name).copied().unwrap_or(0);
                CollegeView {
                    id: college.id.map(|id| id.to_hex()),
                    name: college.name,
                    student_count,
                }
            })
            .collect();

        let mut view = self.view.write().await;
        view.mode = CollegeMode::Table;
        view.refreshed_at = Some(Utc::now());
        view.colleges = views;
    }

    async fn apply_derived(&self, student_colleges: &[String]) {
        let views = count_by_name(student_colleges)
            .into_iter()
            .map(|(name, student_count)| CollegeView {
                id: None,
                name,
                student_count,
            })
            .collect();

        let mut view = self.view.write().await;
        view.mode = CollegeMode::Derived;
        view.refreshed_at = Some(Utc::now());
        view.colleges = views;
    }
}

fn count_by_name(student_colleges: &[String]) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for name in student_colleges {
        if name.is_empty() {
            continue;
        }
        *counts.entry(name.clone()).or_insert(0) += 1;
    }
    counts
}

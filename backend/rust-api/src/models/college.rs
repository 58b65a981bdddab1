use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::bson_datetime_as_chrono_option;

/// College record in the "colleges" collection, when that collection exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct College {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(default)]
    pub name: String,
    #[serde(
        rename = "createdAt",
        default,
        skip_serializing_if = "Option::is_none",
        with = "bson_datetime_as_chrono_option"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

/// Where the current college list comes from: the real collection, or names
/// derived from student records after the collection was confirmed missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CollegeMode {
    Table,
    Derived,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollegeView {
    /// Absent for derived entries, which are never persisted
    pub id: Option<String>,
    pub name: String,
    pub student_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollegeDirectoryResponse {
    pub mode: CollegeMode,
    /// True once the missing collection pinned the directory to derived mode;
    /// stays true until the retry action resets it
    pub halted: bool,
    pub refreshed_at: Option<DateTime<Utc>>,
    pub colleges: Vec<CollegeView>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCollegeRequest {
    #[validate(length(
        min = 1,
        max = 200,
        message = "College name must be between 1 and 200 characters"
    ))]
    pub name: String,
}

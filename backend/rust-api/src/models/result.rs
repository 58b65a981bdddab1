use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::bson_datetime_as_chrono_option;

/// Completed-test record, read-only from the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamResult {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(rename = "studentEmail", default)]
    pub student_email: String,
    #[serde(rename = "studentName", default, skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    #[serde(rename = "testTitle", default)]
    pub test_title: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub percentage: f64,
    #[serde(
        rename = "completedAt",
        default,
        skip_serializing_if = "Option::is_none",
        with = "bson_datetime_as_chrono_option"
    )]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct ResultResponse {
    pub id: String,
    pub student_email: String,
    pub student_name: Option<String>,
    pub test_title: String,
    pub score: f64,
    pub percentage: f64,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<ExamResult> for ResultResponse {
    fn from(result: ExamResult) -> Self {
        ResultResponse {
            id: result.id.map(|id| id.to_hex()).unwrap_or_default(),
            student_email: result.student_email,
            student_name: result.student_name,
            test_title: result.test_title,
            score: result.score,
            percentage: result.percentage,
            completed_at: result.completed_at,
        }
    }
}

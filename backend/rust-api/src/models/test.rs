use chrono::{DateTime, Utc};
use mongodb::bson::{oid::ObjectId, Bson};
use serde::{Deserialize, Serialize};

use super::bson_datetime_as_chrono_option;

/// Test definition as stored by the creation/scheduling tabs. The dashboard
/// only reads these; question payloads stay loosely structured documents and
/// only the fields the stat cards derive from are typed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamTest {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub modules: Vec<TestModule>,
    #[serde(
        rename = "scheduledStart",
        default,
        skip_serializing_if = "Option::is_none",
        with = "bson_datetime_as_chrono_option"
    )]
    pub scheduled_start: Option<DateTime<Utc>>,
    #[serde(
        rename = "scheduledEnd",
        default,
        skip_serializing_if = "Option::is_none",
        with = "bson_datetime_as_chrono_option"
    )]
    pub scheduled_end: Option<DateTime<Utc>>,
    #[serde(rename = "assignedColleges", default)]
    pub assigned_colleges: Vec<String>,
    #[serde(rename = "assignedStudents", default)]
    pub assigned_students: Vec<String>,
    #[serde(
        rename = "createdAt",
        default,
        skip_serializing_if = "Option::is_none",
        with = "bson_datetime_as_chrono_option"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestModule {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub questions: Vec<Bson>,
}

/// Listing row for the dashboard's read-only tests view
#[derive(Debug, Serialize)]
pub struct TestSummary {
    pub id: String,
    pub title: String,
    pub modules: Vec<String>,
    pub question_count: usize,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub scheduled_end: Option<DateTime<Utc>>,
    pub assigned_college_count: usize,
    pub assigned_student_count: usize,
}

impl From<ExamTest> for TestSummary {
    fn from(test: ExamTest) -> Self {
        let question_count = test.modules.iter().map(|m| m.questions.len()).sum();
        TestSummary {
            id: test.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: test.title,
            modules: test.modules.into_iter().map(|m| m.key).collect(),
            question_count,
            scheduled_start: test.scheduled_start,
            scheduled_end: test.scheduled_end,
            assigned_college_count: test.assigned_colleges.len(),
            assigned_student_count: test.assigned_students.len(),
        }
    }
}

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::bson_datetime_as_chrono_option;

/// Account record in the "users" collection. The platform keeps every role in
/// one collection; the dashboard manages the role="student" subset. Records
/// are written by the registration flow with no enforced schema, so every
/// field beyond email is treated as possibly absent.
///
/// Passwords are stored verbatim by the upstream registration flow and
/// compared verbatim by the credential operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub college: Option<String>,
    #[serde(
        rename = "createdAt",
        default,
        skip_serializing_if = "Option::is_none",
        with = "bson_datetime_as_chrono_option"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        rename = "updatedAt",
        default,
        skip_serializing_if = "Option::is_none",
        with = "bson_datetime_as_chrono_option"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_role() -> String {
    "student".to_string()
}

/// Student returned to the dashboard (never includes the password)
#[derive(Debug, Serialize)]
pub struct StudentResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub college: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<Student> for StudentResponse {
    fn from(student: Student) -> Self {
        StudentResponse {
            id: student.id.map(|id| id.to_hex()).unwrap_or_default(),
            email: student.email,
            name: student.name,
            college: student.college,
            created_at: student.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateStudentRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(
        min = 1,
        max = 100,
        message = "Name must be between 1 and 100 characters"
    ))]
    pub name: String,

    #[validate(length(min = 4, message = "Password must be at least 4 characters"))]
    pub password: String,

    pub college: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateStudentRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Name must be between 1 and 100 characters"
    ))]
    pub name: Option<String>,

    pub college: Option<String>,

    #[validate(length(min = 4, message = "Password must be at least 4 characters"))]
    pub password: Option<String>,
}

/// Query params for listing students
#[derive(Debug, Deserialize)]
pub struct ListStudentsQuery {
    pub search: Option<String>, // search by email or name
    pub college: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

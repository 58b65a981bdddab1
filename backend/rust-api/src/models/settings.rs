use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::bson_datetime_as_chrono_option;

/// Per-admin dashboard preference document. Holds the active tab so the
/// dashboard restores where the admin left off.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardPreference {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String,
    #[serde(rename = "activeTab", default = "default_tab")]
    pub active_tab: String,
    #[serde(
        rename = "updatedAt",
        default,
        skip_serializing_if = "Option::is_none",
        with = "bson_datetime_as_chrono_option"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

pub fn default_tab() -> String {
    "overview".to_string()
}

#[derive(Debug, Serialize)]
pub struct PreferenceResponse {
    pub email: String,
    pub active_tab: String,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdatePreferenceRequest {
    #[validate(length(min = 1, max = 64, message = "Tab name must be 1-64 characters"))]
    pub active_tab: String,
}

/// Request to change the admin credential. The stored password is compared
/// verbatim to current_password before the overwrite.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangeCredentialsRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    #[validate(length(min = 4, message = "New password must be at least 4 characters"))]
    pub new_password: String,
}

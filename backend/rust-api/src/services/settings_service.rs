use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use mongodb::bson::{doc, Document};
use mongodb::Database;

use crate::config::CollectionNames;
use crate::models::settings::{
    default_tab, ChangeCredentialsRequest, DashboardPreference, PreferenceResponse,
};
use crate::utils::time::chrono_to_bson;

pub struct SettingsService {
    mongo: Database,
    collections: CollectionNames,
}

impl SettingsService {
    pub fn new(mongo: Database, collections: CollectionNames) -> Self {
        Self { mongo, collections }
    }

    /// Admin credential change: read-modify-write on the account keyed by
    /// email. The stored password is compared verbatim to the submitted
    /// current value; on match the new value overwrites it together with the
    /// updatedAt stamp. Deliberately nothing more: no hashing, no rate limit,
    /// no persisted audit record.
    pub async fn change_credentials(&self, req: ChangeCredentialsRequest) -> Result<()> {
        let users = self.mongo.collection::<Document>(&self.collections.users);

        let account = users
            .find_one(doc! { "email": &req.email })
            .await
            .context("Failed to fetch account")?
            .ok_or_else(|| anyhow!("Account not found"))?;

        let stored = account.get_str("password").unwrap_or_default();
        if stored != req.current_password {
            return Err(anyhow!("Current password is incorrect"));
        }

        users
            .update_one(
                doc! { "email": &req.email },
                doc! {
                    "$set": {
                        "password": &req.new_password,
                        "updatedAt": chrono_to_bson(Utc::now()),
                    }
                },
            )
            .await
            .context("Failed to update credentials")?;

        tracing::info!(email = %req.email, "Admin credentials updated");

        Ok(())
    }

    /// Active-tab selection, restored on dashboard load.
    pub async fn get_preference(&self, email: &str) -> Result<PreferenceResponse> {
        let preferences = self
            .mongo
            .collection::<DashboardPreference>(&self.collections.preferences);

        let preference = preferences
            .find_one(doc! { "email": email })
            .await
            .context("Failed to fetch dashboard preference")?;

        Ok(match preference {
            Some(preference) => PreferenceResponse {
                email: preference.email,
                active_tab: preference.active_tab,
                updated_at: preference.updated_at,
            },
            None => PreferenceResponse {
                email: email.to_string(),
                active_tab: default_tab(),
                updated_at: None,
            },
        })
    }

    pub async fn put_preference(&self, email: &str, active_tab: &str) -> Result<PreferenceResponse> {
        let preferences = self
            .mongo
            .collection::<DashboardPreference>(&self.collections.preferences);

        let now = Utc::now();
        preferences
            .update_one(
                doc! { "email": email },
                doc! {
                    "$set": {
                        "email": email,
                        "activeTab": active_tab,
                        "updatedAt": chrono_to_bson(now),
                    }
                },
            )
            .upsert(true)
            .await
            .context("Failed to upsert dashboard preference")?;

        Ok(PreferenceResponse {
            email: email.to_string(),
            active_tab: active_tab.to_string(),
            updated_at: Some(now),
        })
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::ticket::EventSnapshot;

/// The single event this deployment admits people to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct EventSettings {
    pub id: Uuid,
    pub name: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventSettings {
    pub fn snapshot(&self) -> EventSnapshot {
        EventSnapshot {
            name: self.name.clone(),
            date: self.date.clone(),
            location: self.location.clone(),
        }
    }
}

/// Replacement values for the event settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSettingsUpdate {
    pub name: String,
    pub date: String,
    pub time: String,
    pub location: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
}

impl EventSettingsUpdate {
    /// Returns the name of the first required field that is blank.
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("name", &self.name),
            ("date", &self.date),
            ("time", &self.time),
            ("location", &self.location),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
    }
}

impl Default for EventSettingsUpdate {
    fn default() -> Self {
        Self {
            name: "Tech Conference 2025".to_string(),
            date: "2025-03-15".to_string(),
            time: "9:00 AM".to_string(),
            location: "City Convention Center".to_string(),
            description: Some("A conference on the latest trends in technology".to_string()),
            logo_url: None,
        }
    }
}

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::RetryPolicy;
use crate::models::{EventSettings, EventSettingsUpdate};
use crate::store::EventStore;
use crate::utils::error::AppError;

/// Read and replace the event settings that new tickets snapshot.
pub struct EventService {
    store: Arc<dyn EventStore>,
    retry: RetryPolicy,
}

impl EventService {
    pub fn new(store: Arc<dyn EventStore>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Current settings, seeding the defaults on first use.
    pub async fn current(&self) -> Result<EventSettings, AppError> {
        if let Some(settings) = self.retry.run("event_current", || self.store.current()).await? {
            return Ok(settings);
        }

        info!("No event settings stored, seeding defaults");
        self.save(EventSettingsUpdate::default()).await
    }

    pub async fn save(&self, update: EventSettingsUpdate) -> Result<EventSettings, AppError> {
        if let Some(field) = update.missing_field() {
            return Err(AppError::ValidationError(format!(
                "Event {} is required",
                field
            )));
        }

        let now = Utc::now();
        let settings = self
            .retry
            .run("event_save", || self.store.save(&update, now))
            .await?;

        info!(event = %settings.name, date = %settings.date, "Event settings saved");
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryEventStore;

    fn service() -> EventService {
        EventService::new(Arc::new(MemoryEventStore::new()), RetryPolicy::none())
    }

    #[tokio::test]
    async fn test_current_seeds_defaults() {
        let events = service();
        let settings = events.current().await.unwrap();
        assert_eq!(settings.name, EventSettingsUpdate::default().name);

        // Seeded once, then read back
        let again = events.current().await.unwrap();
        assert_eq!(settings.id, again.id);
    }

    #[tokio::test]
    async fn test_save_rejects_blank_name() {
        let update = EventSettingsUpdate {
            name: String::new(),
            ..EventSettingsUpdate::default()
        };
        let err = service().save(update).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}

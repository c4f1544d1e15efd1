//! In-process stores. Each operation is one critical section; nothing
//! survives a restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use super::{EventStore, InsertOutcome, StoreError, TicketStore, TransitionOutcome};
use crate::models::{contact_key, CheckState, EventSettings, EventSettingsUpdate, Ticket};

#[derive(Default)]
struct Tables {
    by_id: HashMap<String, Ticket>,
    /// Contact key -> ticket id
    by_contact: HashMap<String, String>,
}

#[derive(Default)]
pub struct MemoryTicketStore {
    tables: Mutex<Tables>,
}

impl MemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        // Writes happen only after every check passes
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl TicketStore for MemoryTicketStore {
    async fn find_by_identity(&self, contact: &str) -> Result<Option<Ticket>, StoreError> {
        let tables = self.tables();
        Ok(tables
            .by_contact
            .get(&contact_key(contact))
            .and_then(|id| tables.by_id.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Ticket>, StoreError> {
        Ok(self.tables().by_id.get(id).cloned())
    }

    async fn insert_if_absent(&self, ticket: &Ticket) -> Result<InsertOutcome, StoreError> {
        let mut tables = self.tables();
        let key = ticket.dedup_key();

        if let Some(existing) = tables.by_contact.get(&key) {
            return Ok(InsertOutcome::AlreadyExists(existing.clone()));
        }
        if tables.by_id.contains_key(&ticket.id) {
            return Ok(InsertOutcome::IdCollision);
        }

        tables.by_contact.insert(key, ticket.id.clone());
        tables.by_id.insert(ticket.id.clone(), ticket.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn transition_to_used(
        &self,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<TransitionOutcome, StoreError> {
        let mut tables = self.tables();
        let Some(ticket) = tables.by_id.get_mut(id) else {
            return Ok(TransitionOutcome::NotFound);
        };

        Ok(match ticket.check_state {
            CheckState::Used { at } => TransitionOutcome::AlreadyUsed(at),
            CheckState::Unused => {
                ticket.check_state = CheckState::Used { at: now };
                TransitionOutcome::Transitioned
            }
        })
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Ok(self.tables().by_id.len() as i64)
    }
}

#[derive(Default)]
pub struct MemoryEventStore {
    settings: Mutex<Option<EventSettings>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn current(&self) -> Result<Option<EventSettings>, StoreError> {
        Ok(self
            .settings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn save(
        &self,
        update: &EventSettingsUpdate,
        now: DateTime<Utc>,
    ) -> Result<EventSettings, StoreError> {
        let mut slot = self.settings.lock().unwrap_or_else(PoisonError::into_inner);
        let (id, created_at) = slot
            .as_ref()
            .map(|current| (current.id, current.created_at))
            .unwrap_or_else(|| (Uuid::new_v4(), now));

        let settings = EventSettings {
            id,
            name: update.name.clone(),
            date: update.date.clone(),
            time: update.time.clone(),
            location: update.location.clone(),
            description: update.description.clone(),
            logo_url: update.logo_url.clone(),
            created_at,
            updated_at: now,
        };
        *slot = Some(settings.clone());
        Ok(settings)
    }
}

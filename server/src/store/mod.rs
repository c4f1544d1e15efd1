use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{EventSettings, EventSettingsUpdate, Ticket};

pub mod memory;
pub mod postgres;

pub use memory::{MemoryEventStore, MemoryTicketStore};
pub use postgres::{PgEventStore, PgTicketStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A ticket already exists for the contact address; carries its id.
    AlreadyExists(String),
    /// The minted id is taken by another registrant. Mint again.
    IdCollision,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Transitioned,
    AlreadyUsed(DateTime<Utc>),
    NotFound,
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// Connectivity, timeout or contention failure. Safe to retry.
    #[error("ticket store unavailable")]
    Unavailable(#[source] sqlx::Error),

    #[error("ticket store query failed")]
    Database(#[source] sqlx::Error),

    /// A stored row violates the ticket model.
    #[error("stored record is inconsistent: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if is_transient(&err) {
            StoreError::Unavailable(err)
        } else {
            StoreError::Database(err)
        }
    }
}

fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db) => db.code().is_some_and(|code| {
            // 08xxx connection exception, 40001 serialization failure,
            // 40P01 deadlock, 53300 too many connections, 57P0x shutdown
            code.starts_with("08")
                || code == "40001"
                || code == "40P01"
                || code == "53300"
                || code.starts_with("57P0")
        }),
        _ => false,
    }
}

#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Latest committed ticket for a contact address, if any.
    async fn find_by_identity(&self, contact: &str) -> Result<Option<Ticket>, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Ticket>, StoreError>;

    /// Create `ticket` unless its contact address already holds one. The
    /// uniqueness check and the write happen as one atomic step.
    async fn insert_if_absent(&self, ticket: &Ticket) -> Result<InsertOutcome, StoreError>;

    /// The only mutation of an issued ticket: `Unused -> Used` at `now`,
    /// applied as a single conditional update.
    async fn transition_to_used(
        &self,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<TransitionOutcome, StoreError>;

    async fn count(&self) -> Result<i64, StoreError>;
}

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn current(&self) -> Result<Option<EventSettings>, StoreError>;

    async fn save(
        &self,
        update: &EventSettingsUpdate,
        now: DateTime<Utc>,
    ) -> Result<EventSettings, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_exhaustion_is_retryable() {
        assert!(StoreError::from(sqlx::Error::PoolTimedOut).is_retryable());
        assert!(StoreError::from(sqlx::Error::PoolClosed).is_retryable());
    }

    #[test]
    fn test_row_not_found_is_not_retryable() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(!err.is_retryable());
        assert!(matches!(err, StoreError::Database(_)));
    }

    #[test]
    fn test_corrupt_is_not_retryable() {
        assert!(!StoreError::Corrupt("bad row".to_string()).is_retryable());
    }
}

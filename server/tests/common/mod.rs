#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use doorcheck_server::models::{
    EventSettings, EventSettingsUpdate, EventSnapshot, Identity, Ticket,
};
use doorcheck_server::services::{CheckInService, IssuanceService, RetryPolicy};
use doorcheck_server::store::{
    EventStore, InsertOutcome, MemoryTicketStore, StoreError, TicketStore, TransitionOutcome,
};

pub fn identity(email: &str, age: i32) -> Identity {
    Identity {
        name: "Ana Torres".to_string(),
        email: email.to_string(),
        phone: "555-0100".to_string(),
        age,
    }
}

pub fn event() -> EventSnapshot {
    EventSnapshot {
        name: "Tech Conference 2025".to_string(),
        date: "2025-03-15".to_string(),
        location: "City Convention Center".to_string(),
    }
}

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
    }
}

pub fn services(store: Arc<dyn TicketStore>) -> (IssuanceService, CheckInService) {
    (
        IssuanceService::new(store.clone(), fast_retry()),
        CheckInService::new(store, fast_retry()),
    )
}

fn unavailable() -> StoreError {
    StoreError::Unavailable(sqlx::Error::PoolTimedOut)
}

fn take_one(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

/// Memory store whose next `failures` calls fail as if the database were
/// unreachable. Other faults can be armed on top.
pub struct FlakyStore {
    inner: MemoryTicketStore,
    failures: AtomicU32,
    calls: AtomicU32,
    /// Inserts reported as id collisions without writing.
    collisions: AtomicU32,
    /// Transitions that commit and then report `Unavailable`.
    lost_commits: AtomicU32,
    /// Once set, `find_by_id` fails after any ticket has been admitted.
    reads_fail_after_admission: AtomicBool,
    admitted: AtomicBool,
}

impl FlakyStore {
    pub fn new(failures: u32) -> Self {
        Self {
            inner: MemoryTicketStore::new(),
            failures: AtomicU32::new(failures),
            calls: AtomicU32::new(0),
            collisions: AtomicU32::new(0),
            lost_commits: AtomicU32::new(0),
            reads_fail_after_admission: AtomicBool::new(false),
            admitted: AtomicBool::new(false),
        }
    }

    pub fn fail_next(&self, failures: u32) {
        self.failures.store(failures, Ordering::SeqCst);
    }

    pub fn collide_next(&self, inserts: u32) {
        self.collisions.store(inserts, Ordering::SeqCst);
    }

    pub fn lose_next_commits(&self, transitions: u32) {
        self.lost_commits.store(transitions, Ordering::SeqCst);
    }

    pub fn fail_reads_after_admission(&self) {
        self.reads_fail_after_admission.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn trip(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if take_one(&self.failures) {
            Err(unavailable())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TicketStore for FlakyStore {
    async fn find_by_identity(&self, contact: &str) -> Result<Option<Ticket>, StoreError> {
        self.trip()?;
        self.inner.find_by_identity(contact).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Ticket>, StoreError> {
        self.trip()?;
        if self.reads_fail_after_admission.load(Ordering::SeqCst)
            && self.admitted.load(Ordering::SeqCst)
        {
            return Err(unavailable());
        }
        self.inner.find_by_id(id).await
    }

    async fn insert_if_absent(&self, ticket: &Ticket) -> Result<InsertOutcome, StoreError> {
        self.trip()?;
        if take_one(&self.collisions) {
            return Ok(InsertOutcome::IdCollision);
        }
        self.inner.insert_if_absent(ticket).await
    }

    async fn transition_to_used(
        &self,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<TransitionOutcome, StoreError> {
        self.trip()?;
        let outcome = self.inner.transition_to_used(id, now).await?;
        if outcome == TransitionOutcome::Transitioned {
            self.admitted.store(true, Ordering::SeqCst);
        }
        if take_one(&self.lost_commits) {
            return Err(unavailable());
        }
        Ok(outcome)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        self.trip()?;
        self.inner.count().await
    }
}

/// Event settings store that is never reachable.
pub struct DownEventStore;

#[async_trait]
impl EventStore for DownEventStore {
    async fn current(&self) -> Result<Option<EventSettings>, StoreError> {
        Err(unavailable())
    }

    async fn save(
        &self,
        _update: &EventSettingsUpdate,
        _now: DateTime<Utc>,
    ) -> Result<EventSettings, StoreError> {
        Err(unavailable())
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::warn;

use super::{EventStore, InsertOutcome, StoreError, TicketStore, TransitionOutcome};
use crate::models::{
    contact_key, CheckState, EventSettings, EventSettingsUpdate, EventSnapshot, Identity, Ticket,
};

const TICKETS_PKEY: &str = "tickets_pkey";

/// Row shape of the `tickets` table.
#[derive(Debug, FromRow)]
struct TicketRow {
    id: String,
    name: String,
    email: String,
    phone: String,
    age: i32,
    event_name: String,
    event_date: String,
    event_location: String,
    created_at: DateTime<Utc>,
    checked_in: bool,
    checked_in_at: Option<DateTime<Utc>>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = StoreError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        let check_state = match (row.checked_in, row.checked_in_at) {
            (false, None) => CheckState::Unused,
            (true, Some(at)) => CheckState::Used { at },
            (checked_in, at) => {
                return Err(StoreError::Corrupt(format!(
                    "ticket {} has checked_in={} but checked_in_at={:?}",
                    row.id, checked_in, at
                )))
            }
        };

        Ok(Ticket {
            id: row.id,
            identity: Identity {
                name: row.name,
                email: row.email,
                phone: row.phone,
                age: row.age,
            },
            event: EventSnapshot {
                name: row.event_name,
                date: row.event_date,
                location: row.event_location,
            },
            created_at: row.created_at,
            check_state,
        })
    }
}

const TICKET_COLUMNS: &str = "id, name, email, phone, age, event_name, event_date, \
                              event_location, created_at, checked_in, checked_in_at";

#[derive(Clone)]
pub struct PgTicketStore {
    pool: PgPool,
}

impl PgTicketStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn existing_id_for(&self, key: &str) -> Result<Option<String>, StoreError> {
        let id = sqlx::query_scalar::<_, String>("SELECT id FROM tickets WHERE email_key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }
}

#[async_trait]
impl TicketStore for PgTicketStore {
    async fn find_by_identity(&self, contact: &str) -> Result<Option<Ticket>, StoreError> {
        let row = sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE email_key = $1"
        ))
        .bind(contact_key(contact))
        .fetch_optional(&self.pool)
        .await?;

        row.map(Ticket::try_from).transpose()
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Ticket>, StoreError> {
        let row = sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Ticket::try_from).transpose()
    }

    /// `ON CONFLICT (email_key) DO NOTHING` lets the unique constraint decide
    /// which of two racing registrations wins. A primary-key clash still
    /// raises, and is reported as an id collision.
    async fn insert_if_absent(&self, ticket: &Ticket) -> Result<InsertOutcome, StoreError> {
        let key = ticket.dedup_key();

        // The loser of a race can find the winner's row gone only if an
        // administrator deleted it in between; one more attempt settles it.
        for _ in 0..2 {
            let inserted = sqlx::query_scalar::<_, String>(
                r#"
                INSERT INTO tickets (
                    id, name, email, email_key, phone, age,
                    event_name, event_date, event_location,
                    created_at, checked_in, checked_in_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, FALSE, NULL)
                ON CONFLICT (email_key) DO NOTHING
                RETURNING id
                "#,
            )
            .bind(&ticket.id)
            .bind(&ticket.identity.name)
            .bind(&ticket.identity.email)
            .bind(&key)
            .bind(&ticket.identity.phone)
            .bind(ticket.identity.age)
            .bind(&ticket.event.name)
            .bind(&ticket.event.date)
            .bind(&ticket.event.location)
            .bind(ticket.created_at)
            .fetch_optional(&self.pool)
            .await;

            match inserted {
                Ok(Some(_)) => return Ok(InsertOutcome::Inserted),
                Ok(None) => {
                    if let Some(existing) = self.existing_id_for(&key).await? {
                        return Ok(InsertOutcome::AlreadyExists(existing));
                    }
                }
                Err(sqlx::Error::Database(db))
                    if db.is_unique_violation() && db.constraint() == Some(TICKETS_PKEY) =>
                {
                    return Ok(InsertOutcome::IdCollision);
                }
                Err(e) => return Err(e.into()),
            }
        }

        warn!(contact_key = %key, "Conflicting ticket disappeared during insert");
        Err(StoreError::Corrupt(format!(
            "ticket for {key} conflicted but could not be read back"
        )))
    }

    async fn transition_to_used(
        &self,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<TransitionOutcome, StoreError> {
        let transitioned = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            UPDATE tickets
            SET checked_in = TRUE, checked_in_at = $2
            WHERE id = $1 AND checked_in = FALSE
            RETURNING checked_in_at
            "#,
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        if transitioned.is_some() {
            return Ok(TransitionOutcome::Transitioned);
        }

        // No row matched. `Used` is terminal, so reading it now is stable.
        let state = sqlx::query_as::<_, (bool, Option<DateTime<Utc>>)>(
            "SELECT checked_in, checked_in_at FROM tickets WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match state {
            None => Ok(TransitionOutcome::NotFound),
            Some((true, Some(at))) => Ok(TransitionOutcome::AlreadyUsed(at)),
            // Inserted after our UPDATE ran. From the scanner's point of view
            // the ticket did not exist yet.
            Some((false, None)) => Ok(TransitionOutcome::NotFound),
            Some((checked_in, at)) => Err(StoreError::Corrupt(format!(
                "ticket {id} has checked_in={checked_in} but checked_in_at={at:?}"
            ))),
        }
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tickets")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn current(&self) -> Result<Option<EventSettings>, StoreError> {
        let settings = sqlx::query_as::<_, EventSettings>(
            r#"
            SELECT id, name, date, time, location, description, logo_url, created_at, updated_at
            FROM event_settings
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(settings)
    }

    /// Upsert on the singleton key, so concurrent saves never create a
    /// second settings row.
    async fn save(
        &self,
        update: &EventSettingsUpdate,
        now: DateTime<Utc>,
    ) -> Result<EventSettings, StoreError> {
        let settings = sqlx::query_as::<_, EventSettings>(
            r#"
            INSERT INTO event_settings (
                id, name, date, time, location, description, logo_url, created_at, updated_at
            )
            VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, $6, $7, $7)
            ON CONFLICT (singleton) DO UPDATE SET
                name = EXCLUDED.name,
                date = EXCLUDED.date,
                time = EXCLUDED.time,
                location = EXCLUDED.location,
                description = EXCLUDED.description,
                logo_url = EXCLUDED.logo_url,
                updated_at = EXCLUDED.updated_at
            RETURNING id, name, date, time, location, description, logo_url, created_at, updated_at
            "#,
        )
        .bind(&update.name)
        .bind(&update.date)
        .bind(&update.time)
        .bind(&update.location)
        .bind(&update.description)
        .bind(&update.logo_url)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(settings)
    }
}

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::RetryPolicy;
use crate::codec;
use crate::models::{EventSnapshot, Identity, Ticket};
use crate::store::{InsertOutcome, TicketStore};
use crate::utils::error::AppError;

pub const MIN_AGE: i32 = 1;
pub const MAX_AGE: i32 = 120;

/// Fresh ids to try when a minted id is already taken.
const MAX_MINT_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issued {
    pub ticket_id: String,
    /// The registrant already held this ticket.
    pub resumed: bool,
}

/// Checks registrant data before any store access.
pub fn validate(identity: &Identity) -> Result<(), AppError> {
    if identity.name.trim().is_empty() {
        return Err(AppError::ValidationError("Name is required".to_string()));
    }

    let email = identity.email.trim();
    if email.is_empty() {
        return Err(AppError::ValidationError(
            "Email address is required".to_string(),
        ));
    }
    if !email.contains('@') {
        return Err(AppError::ValidationError(format!(
            "'{}' is not a valid email address",
            email
        )));
    }

    if !(MIN_AGE..=MAX_AGE).contains(&identity.age) {
        return Err(AppError::ValidationError(format!(
            "Please enter a valid age ({}-{} years)",
            MIN_AGE, MAX_AGE
        )));
    }

    Ok(())
}

/// Issues at most one ticket per contact address.
pub struct IssuanceService {
    store: Arc<dyn TicketStore>,
    retry: RetryPolicy,
}

impl IssuanceService {
    pub fn new(store: Arc<dyn TicketStore>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Return the registrant's ticket id, creating the ticket on first
    /// registration. Repeated and concurrent calls for one contact address
    /// all return the same id.
    pub async fn issue(&self, identity: Identity, event: EventSnapshot) -> Result<Issued, AppError> {
        let identity = identity.trimmed();
        validate(&identity)?;

        let existing = self
            .retry
            .run("find_by_identity", || {
                self.store.find_by_identity(&identity.email)
            })
            .await?;
        if let Some(ticket) = existing {
            info!(ticket_id = %ticket.id, "Registrant already holds a ticket");
            return Ok(Issued {
                ticket_id: ticket.id,
                resumed: true,
            });
        }

        let created_at = Utc::now();
        for _ in 0..MAX_MINT_ATTEMPTS {
            let ticket = Ticket::new(
                codec::mint_at(created_at),
                identity.clone(),
                event.clone(),
                created_at,
            );

            let outcome = self
                .retry
                .run("insert_if_absent", || self.store.insert_if_absent(&ticket))
                .await?;

            match outcome {
                InsertOutcome::Inserted => {
                    info!(ticket_id = %ticket.id, event = %event.name, "Ticket issued");
                    return Ok(Issued {
                        ticket_id: ticket.id,
                        resumed: false,
                    });
                }
                InsertOutcome::AlreadyExists(winner) => {
                    info!(ticket_id = %winner, "Concurrent registration already issued a ticket");
                    return Ok(Issued {
                        ticket_id: winner,
                        resumed: true,
                    });
                }
                InsertOutcome::IdCollision => {
                    warn!(ticket_id = %ticket.id, "Minted ticket id already taken, minting again");
                }
            }
        }

        Err(AppError::InternalServerError(format!(
            "no unique ticket id after {} attempts",
            MAX_MINT_ATTEMPTS
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(age: i32) -> Identity {
        Identity {
            name: "Ana".to_string(),
            email: "a@x.com".to_string(),
            phone: "555-0100".to_string(),
            age,
        }
    }

    #[test]
    fn test_age_bounds() {
        assert!(validate(&identity(1)).is_ok());
        assert!(validate(&identity(120)).is_ok());
        assert!(matches!(validate(&identity(0)), Err(AppError::ValidationError(_))));
        assert!(matches!(validate(&identity(121)), Err(AppError::ValidationError(_))));
    }

    #[test]
    fn test_contact_is_required() {
        let mut blank = identity(30);
        blank.email = "   ".to_string();
        assert!(matches!(validate(&blank), Err(AppError::ValidationError(_))));

        let mut no_at = identity(30);
        no_at.email = "ana.example.com".to_string();
        assert!(matches!(validate(&no_at), Err(AppError::ValidationError(_))));
    }

    #[test]
    fn test_name_is_required() {
        let mut nameless = identity(30);
        nameless.name = String::new();
        assert!(matches!(validate(&nameless), Err(AppError::ValidationError(_))));
    }
}

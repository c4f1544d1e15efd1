use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use tracing::{debug, info, warn};

use super::RetryPolicy;
use crate::codec;
use crate::models::{CheckState, Ticket};
use crate::store::{TicketStore, TransitionOutcome};
use crate::utils::error::AppError;

/// Result of presenting a code at the door. All three are answers for the
/// station to show, not failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckInOutcome {
    Admitted,
    /// Carries the time of the original admission.
    AlreadyAdmitted(DateTime<Utc>),
    /// Forged, garbled or foreign code.
    Unknown,
}

impl CheckInOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckInOutcome::Admitted => "admitted",
            CheckInOutcome::AlreadyAdmitted(_) => "already_admitted",
            CheckInOutcome::Unknown => "unknown",
        }
    }
}

/// A check-in decision together with the ticket it applies to.
#[derive(Debug, Clone, PartialEq)]
pub struct Admission {
    pub outcome: CheckInOutcome,
    /// `None` exactly when the outcome is `Unknown`.
    pub ticket: Option<Ticket>,
}

impl Admission {
    fn unknown() -> Self {
        Self {
            outcome: CheckInOutcome::Unknown,
            ticket: None,
        }
    }
}

pub struct CheckInService {
    store: Arc<dyn TicketStore>,
    retry: RetryPolicy,
}

impl CheckInService {
    pub fn new(store: Arc<dyn TicketStore>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Admit the holder of `ticket_id` at most once. Of any number of
    /// concurrent calls for one unused ticket, exactly one sees `Admitted`.
    pub async fn check_in(&self, ticket_id: &str) -> Result<CheckInOutcome, AppError> {
        Ok(self.admit(ticket_id).await?.outcome)
    }

    /// Like [`check_in`](Self::check_in), but also returns the ticket as it
    /// stands after the decision. Once the store has decided, nothing else is
    /// read, so a later store failure cannot hide an admission.
    pub async fn admit(&self, ticket_id: &str) -> Result<Admission, AppError> {
        if !codec::is_plausible(ticket_id) {
            debug!(payload_len = ticket_id.len(), "Scanned payload is not a ticket id");
            return Ok(Admission::unknown());
        }

        let found = self
            .retry
            .run("find_by_id", || self.store.find_by_id(ticket_id))
            .await?;
        let Some(mut ticket) = found else {
            info!(ticket_id, outcome = "unknown", "Check-in rejected");
            return Ok(Admission::unknown());
        };

        // Stored timestamps have microsecond precision
        let now = Utc::now().trunc_subsecs(6);
        let mut attempts = 0u32;
        let transition = self
            .retry
            .run("transition_to_used", || {
                attempts += 1;
                self.store.transition_to_used(ticket_id, now)
            })
            .await?;

        let outcome = match transition {
            TransitionOutcome::Transitioned => CheckInOutcome::Admitted,
            // An earlier attempt committed but its reply was lost
            TransitionOutcome::AlreadyUsed(at) if attempts > 1 && at == now => {
                warn!(ticket_id, "Admission committed on an attempt that reported failure");
                CheckInOutcome::Admitted
            }
            TransitionOutcome::AlreadyUsed(at) => CheckInOutcome::AlreadyAdmitted(at),
            TransitionOutcome::NotFound => CheckInOutcome::Unknown,
        };
        info!(ticket_id, outcome = outcome.as_str(), "Check-in decided");

        let ticket = match outcome {
            CheckInOutcome::Admitted => {
                ticket.check_state = CheckState::Used { at: now };
                Some(ticket)
            }
            CheckInOutcome::AlreadyAdmitted(at) => {
                ticket.check_state = CheckState::Used { at };
                Some(ticket)
            }
            CheckInOutcome::Unknown => None,
        };

        Ok(Admission { outcome, ticket })
    }

    /// Read-only view for the scanning station. Never changes check-in state.
    pub async fn lookup(&self, ticket_id: &str) -> Result<Option<Ticket>, AppError> {
        if !codec::is_plausible(ticket_id) {
            return Ok(None);
        }

        let ticket = self
            .retry
            .run("find_by_id", || self.store.find_by_id(ticket_id))
            .await?;
        Ok(ticket)
    }
}

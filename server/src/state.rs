use std::sync::Arc;

use crate::config::AccessConfig;
use crate::services::{CheckInService, EventService, IssuanceService, RetryPolicy};
use crate::store::{EventStore, TicketStore};

/// Shared by every handler; cloning is cheap.
///
/// Holds no ticket state of its own. Everything that must stay consistent
/// across stations lives in the store.
#[derive(Clone)]
pub struct AppState {
    pub tickets: Arc<dyn TicketStore>,
    pub issuance: Arc<IssuanceService>,
    pub checkin: Arc<CheckInService>,
    pub events: Arc<EventService>,
    pub access: Arc<AccessConfig>,
}

impl AppState {
    pub fn new(
        tickets: Arc<dyn TicketStore>,
        events: Arc<dyn EventStore>,
        retry: RetryPolicy,
        access: AccessConfig,
    ) -> Self {
        Self {
            issuance: Arc::new(IssuanceService::new(tickets.clone(), retry)),
            checkin: Arc::new(CheckInService::new(tickets.clone(), retry)),
            events: Arc::new(EventService::new(events, retry)),
            access: Arc::new(access),
            tickets,
        }
    }
}

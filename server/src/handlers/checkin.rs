use axum::{extract::State, response::Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::auth::Station;
use super::extract::ApiJson;
use super::tickets::TicketView;
use crate::services::{Admission, CheckInOutcome};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

#[derive(Debug, Deserialize)]
pub struct CheckInRequest {
    /// Raw payload decoded from the visual code.
    pub ticket_id: String,
}

#[derive(Debug, Serialize)]
pub struct CheckInResponse {
    pub outcome: &'static str,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub ticket: Option<TicketView>,
}

/// `POST /api/checkin`. Every decision is a 200 with the outcome in the body;
/// only store failures produce an error status.
pub async fn check_in(
    station: Station,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CheckInRequest>,
) -> Result<Response, AppError> {
    // Keyboard-wedge scanners append a newline
    let ticket_id = request.ticket_id.trim();
    let Admission { outcome, ticket } = state.checkin.admit(ticket_id).await?;

    info!(
        ticket_id,
        station = station.name(),
        outcome = outcome.as_str(),
        "Scan processed"
    );

    let checked_in_at = ticket.as_ref().and_then(|t| t.check_state.checked_in_at());

    let message = match outcome {
        CheckInOutcome::Admitted => "Entry granted",
        CheckInOutcome::AlreadyAdmitted(_) => "Ticket already checked in",
        CheckInOutcome::Unknown => "Ticket not recognised",
    };

    let payload = CheckInResponse {
        outcome: outcome.as_str(),
        checked_in_at,
        ticket: ticket.map(TicketView::from),
    };
    Ok(success(payload, message))
}

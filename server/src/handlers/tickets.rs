use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::extract::ApiJson;
use crate::codec::encode_for_display;
use crate::models::{Identity, Ticket};
use crate::services::issuance;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{success, success_with_status};

const QR_CACHE_CONTROL: &str = "public, max-age=86400, immutable";

#[derive(Debug, Deserialize)]
pub struct IssueTicketRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub age: i32,
}

impl From<IssueTicketRequest> for Identity {
    fn from(req: IssueTicketRequest) -> Self {
        Identity {
            name: req.name,
            email: req.email,
            phone: req.phone,
            age: req.age,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IssueTicketResponse {
    pub ticket_id: String,
    pub resumed: bool,
    pub qr_url: String,
}

/// Flat ticket shape shown to registrants and scanning stations.
#[derive(Debug, Serialize)]
pub struct TicketView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub age: i32,
    pub event_name: String,
    pub event_date: String,
    pub event_location: String,
    pub created_at: DateTime<Utc>,
    pub checked_in: bool,
    pub checked_in_at: Option<DateTime<Utc>>,
}

impl From<Ticket> for TicketView {
    fn from(ticket: Ticket) -> Self {
        Self {
            checked_in: ticket.check_state.is_used(),
            checked_in_at: ticket.check_state.checked_in_at(),
            id: ticket.id,
            name: ticket.identity.name,
            email: ticket.identity.email,
            phone: ticket.identity.phone,
            age: ticket.identity.age,
            event_name: ticket.event.name,
            event_date: ticket.event.date,
            event_location: ticket.event.location,
            created_at: ticket.created_at,
        }
    }
}

/// `POST /api/tickets`. A contact address that already holds a ticket gets
/// that ticket back with 200 instead of 201.
pub async fn issue_ticket(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<IssueTicketRequest>,
) -> Result<Response, AppError> {
    let identity = Identity::from(request);
    // Reading the event may seed default settings; bad input must not
    issuance::validate(&identity.trimmed())?;

    let event = state.events.current().await?;
    let issued = state.issuance.issue(identity, event.snapshot()).await?;

    let (status, message) = if issued.resumed {
        (StatusCode::OK, "A ticket already exists for this email")
    } else {
        (StatusCode::CREATED, "Ticket issued")
    };

    let payload = IssueTicketResponse {
        qr_url: format!("/api/tickets/{}/qr.svg", issued.ticket_id),
        ticket_id: issued.ticket_id,
        resumed: issued.resumed,
    };
    Ok(success_with_status(status, payload, message))
}

pub async fn get_ticket(
    State(state): State<AppState>,
    Path(ticket_id): Path<String>,
) -> Result<Response, AppError> {
    let ticket = find_ticket(&state, &ticket_id).await?;
    Ok(success(TicketView::from(ticket), "Ticket found"))
}

/// The scannable code for a ticket as SVG. Only issued ids are rendered.
pub async fn ticket_qr(
    State(state): State<AppState>,
    Path(ticket_id): Path<String>,
) -> Result<Response, AppError> {
    let ticket = find_ticket(&state, &ticket_id).await?;
    let svg = encode_for_display(&ticket.id)?.to_svg();

    Ok((
        [
            (header::CONTENT_TYPE, "image/svg+xml"),
            (header::CACHE_CONTROL, QR_CACHE_CONTROL),
        ],
        svg,
    )
        .into_response())
}

async fn find_ticket(state: &AppState, ticket_id: &str) -> Result<Ticket, AppError> {
    state
        .checkin
        .lookup(ticket_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Ticket '{}' was not found", ticket_id)))
}

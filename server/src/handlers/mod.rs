use axum::{extract::State, response::Response};
use serde::Serialize;

use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

pub mod auth;
pub mod checkin;
pub mod event;
pub mod extract;
pub mod tickets;

pub use checkin::check_in;
pub use event::{get_event, update_event};
pub use tickets::{get_ticket, issue_ticket, ticket_qr};

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
    tickets_issued: i64,
}

/// Liveness plus a store round trip. Reports 503 while the store is down.
pub async fn health_check(State(state): State<AppState>) -> Result<Response, AppError> {
    let tickets_issued = state.tickets.count().await?;

    let payload = HealthPayload {
        status: "ok",
        service: "doorcheck-api",
        tickets_issued,
    };

    Ok(success(payload, "Health check successful"))
}

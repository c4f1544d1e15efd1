use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, Config, SecurityHeadersLayer};
use crate::handlers::{
    check_in, get_event, get_ticket, health_check, issue_ticket, ticket_qr, update_event,
};
use crate::state::AppState;

pub fn create_routes(state: AppState, config: &Config) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/event", get(get_event).put(update_event))
        .route("/api/tickets", post(issue_ticket))
        .route("/api/tickets/:id", get(get_ticket))
        .route("/api/tickets/:id/qr.svg", get(ticket_qr))
        .route("/api/checkin", post(check_in))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(SecurityHeadersLayer::new(config.production))
        .layer(create_cors_layer(&config.cors_allowed_origins))
}

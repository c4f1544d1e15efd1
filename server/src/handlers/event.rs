use axum::{extract::State, response::Response};

use super::auth::Admin;
use super::extract::ApiJson;
use crate::models::EventSettingsUpdate;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

pub async fn get_event(State(state): State<AppState>) -> Result<Response, AppError> {
    let settings = state.events.current().await?;
    Ok(success(settings, "Event settings"))
}

/// Replaces the event settings. Tickets already issued keep the details
/// they were issued with.
pub async fn update_event(
    _admin: Admin,
    State(state): State<AppState>,
    ApiJson(update): ApiJson<EventSettingsUpdate>,
) -> Result<Response, AppError> {
    let settings = state.events.save(update).await?;
    Ok(success(settings, "Event settings updated"))
}

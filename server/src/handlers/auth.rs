use axum::{async_trait, extract::FromRequestParts, http::header, http::request::Parts};

use crate::state::AppState;
use crate::utils::error::AppError;

/// Scanning station making a check-in call. `None` when check-in is open.
#[derive(Debug, Clone)]
pub struct Station(pub Option<String>);

impl Station {
    pub fn name(&self) -> &str {
        self.0.as_deref().unwrap_or("open")
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Station {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if state.access.check_in_is_open() {
            return Ok(Self(None));
        }

        let key = bearer_token(parts)?;
        state
            .access
            .station_for(key)
            .map(|name| Self(Some(name.to_string())))
            .ok_or_else(|| AppError::AuthError("Unknown station key".to_string()))
    }
}

/// Caller presented the admin token.
#[derive(Debug, Clone, Copy)]
pub struct Admin;

#[async_trait]
impl FromRequestParts<AppState> for Admin {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if !state.access.admin_enabled() {
            return Err(AppError::Forbidden(
                "Administration is disabled on this server".to_string(),
            ));
        }

        let token = bearer_token(parts)?;
        if state.access.is_admin(token) {
            Ok(Admin)
        } else {
            Err(AppError::AuthError("Invalid admin token".to_string()))
        }
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let value = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::AuthError("Missing authorization header".to_string()))?;

    match value.strip_prefix("Bearer ").map(str::trim) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(AppError::AuthError(
            "Invalid authorization format. Expected 'Bearer <token>'".to_string(),
        )),
    }
}

//! JSON envelope shared by every API route.
//!
//! Successes carry `{"success": true, "data": ..., "message": ...}`, failures
//! carry `{"success": false, "error": {"code", "message", "details"}}`.
//! Scanning stations branch on `success` and then on `data.outcome` or
//! `error.code`, never on the message text.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

#[derive(Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub message: String,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    /// Stable machine-readable code such as `STORE_UNAVAILABLE`.
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: ErrorDetail,
}

pub fn success<T: Serialize>(data: T, message: impl Into<String>) -> Response {
    success_with_status(StatusCode::OK, data, message)
}

pub fn success_with_status<T: Serialize>(
    status: StatusCode,
    data: T,
    message: impl Into<String>,
) -> Response {
    let body = Envelope {
        success: true,
        data,
        message: message.into(),
    };
    (status, Json(body)).into_response()
}

pub fn error(
    code: &'static str,
    message: impl Into<String>,
    details: Option<Value>,
    status: StatusCode,
) -> Response {
    let body = ErrorEnvelope {
        success: false,
        error: ErrorDetail {
            code,
            message: message.into(),
            details,
        },
    };
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn body_of(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_success_envelope() {
        let response = success_with_status(StatusCode::CREATED, json!({ "id": 1 }), "Created");
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_of(response).await;
        assert_eq!(body, json!({ "success": true, "data": { "id": 1 }, "message": "Created" }));
    }

    #[tokio::test]
    async fn test_error_envelope_omits_empty_details() {
        let response = error("NOT_FOUND", "missing", None, StatusCode::NOT_FOUND);
        let body = body_of(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        assert!(body["error"].get("details").is_none());
    }
}

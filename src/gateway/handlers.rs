use super::AppState;
use crate::error::{SreError, ValidationError};
use crate::session::limits::{MAX_MESSAGE_CHARS, checked_session_id};
use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{Value, json};

fn error_body(status: StatusCode, error: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": error })))
}

fn rejected(err: &ValidationError) -> (StatusCode, Json<Value>) {
    error_body(StatusCode::BAD_REQUEST, &err.to_string())
}

/// Trimmed string field, or `None` when absent, mistyped, empty, or too long.
fn bounded_field<'a>(body: &'a Value, key: &str, max_chars: usize) -> Option<&'a str> {
    body.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty() && s.chars().count() <= max_chars)
}

fn describe_rejection(rejection: &JsonRejection) -> String {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => "Expected application/json".to_string(),
        other => other.body_text(),
    }
}

/// POST /api/chat -- run one conversational turn
pub(super) async fn handle_chat(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> impl IntoResponse {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => {
            let err = json!({
                "error": "Invalid JSON request body",
                "details": describe_rejection(&e),
            });
            return (StatusCode::BAD_REQUEST, Json(err));
        }
    };

    let session_id = match body
        .get("sessionId")
        .and_then(Value::as_str)
        .ok_or(ValidationError::InvalidSessionId)
        .and_then(checked_session_id)
    {
        Ok(id) => id,
        Err(e) => return rejected(&e),
    };
    let Some(message) = bounded_field(&body, "message", MAX_MESSAGE_CHARS) else {
        return rejected(&ValidationError::InvalidMessage);
    };

    match state.controller.handle_turn(session_id, message).await {
        Ok(reply) => match serde_json::to_value(&reply) {
            Ok(value) => (StatusCode::OK, Json(value)),
            Err(e) => {
                tracing::error!(session_id, error = %e, "failed to encode turn reply");
                error_body(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }
        },
        Err(SreError::Validation(e)) => rejected(&e),
        Err(e) => {
            tracing::error!(session_id, error = %e, "session handler failed");
            let err = json!({
                "error": "Session handler error",
                "details": e.to_string(),
            });
            (StatusCode::BAD_GATEWAY, Json(err))
        }
    }
}

/// GET /health -- liveness probe
pub(super) async fn handle_health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub(super) async fn handle_not_found() -> impl IntoResponse {
    error_body(StatusCode::NOT_FOUND, "Not Found")
}

pub(super) async fn handle_method_not_allowed() -> impl IntoResponse {
    error_body(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}

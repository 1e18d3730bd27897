use super::cors::apply_cors_headers;
use super::handlers::{handle_chat, handle_health, handle_method_not_allowed, handle_not_found};
use super::*;
use crate::config::SessionConfig;
use crate::error::StorageError;
use crate::llm::{Generator, ScriptedGenerator};
use crate::session::store::StoreFuture;
use crate::session::{InMemorySessionStore, SessionStore, StoredState};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

const INCIDENT: &str = r#"{"type":"latency","severity_guess":"medium","timeframe":"","symptoms":[],"stack_hints":[]}"#;

/// Reads succeed with no state; every write fails.
struct ReadOnlyStore;

impl SessionStore for ReadOnlyStore {
    fn get<'a>(&'a self, _key: &'a str) -> StoreFuture<'a, Option<StoredState>> {
        Box::pin(async { Ok(None) })
    }

    fn put<'a>(&'a self, _key: &'a str, _state: &'a StoredState) -> StoreFuture<'a, ()> {
        Box::pin(async { Err(StorageError::Query("disk full".into())) })
    }
}

fn state_with_store(generator: ScriptedGenerator, store: Arc<dyn SessionStore>) -> AppState {
    let controller = SessionController::new(
        Arc::new(generator) as Arc<dyn Generator>,
        store,
        SessionConfig::default(),
    )
    .unwrap();
    AppState {
        controller: Arc::new(controller),
    }
}

fn state_with(generator: ScriptedGenerator) -> AppState {
    state_with_store(generator, Arc::new(InMemorySessionStore::new()))
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn post_chat(state: AppState, body: Value) -> (StatusCode, Value) {
    let response = handle_chat(State(state), Ok(Json(body))).await.into_response();
    let status = response.status();
    (status, body_json(response).await)
}

#[test]
fn security_body_limit_is_64kb() {
    assert_eq!(MAX_BODY_SIZE, 65_536);
}

#[test]
fn request_timeout_covers_chained_generation() {
    assert_eq!(REQUEST_TIMEOUT_SECS, 180);
}

#[test]
fn loopback_hosts_are_private() {
    assert!(!is_public_bind("127.0.0.1"));
    assert!(!is_public_bind("localhost"));
    assert!(!is_public_bind("::1"));
    assert!(is_public_bind("0.0.0.0"));
    assert!(is_public_bind("192.168.1.10"));
}

#[test]
fn cors_headers_reflect_origin() {
    let mut headers = HeaderMap::new();
    apply_cors_headers(&mut headers, HeaderValue::from_static("https://app.example"));
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://app.example"
    );
    assert_eq!(headers[header::VARY], "Origin");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "false");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST, OPTIONS");
}

#[tokio::test]
async fn health_reports_ok() {
    let response = handle_health().await.into_response();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"status": "ok"}));
}

#[tokio::test]
async fn unknown_route_and_method_are_json() {
    let response = handle_not_found().await.into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await, json!({"error": "Not Found"}));

    let response = handle_method_not_allowed().await.into_response();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        body_json(response).await,
        json!({"error": "Method Not Allowed"})
    );
}

#[tokio::test]
async fn session_id_is_validated() {
    let state = state_with(ScriptedGenerator::default());

    let cases = [
        json!({"message": "hi"}),
        json!({"sessionId": "   ", "message": "hi"}),
        json!({"sessionId": 7, "message": "hi"}),
        json!({"sessionId": "x".repeat(129), "message": "hi"}),
    ];
    for bad in cases {
        let (status, body) = post_chat(state.clone(), bad).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Invalid sessionId"}));
    }
}

#[tokio::test]
async fn message_is_validated() {
    let state = state_with(ScriptedGenerator::default());

    let cases = [
        json!({"sessionId": "s1"}),
        json!({"sessionId": "s1", "message": " \n "}),
        json!({"sessionId": "s1", "message": "m".repeat(4001)}),
    ];
    for bad in cases {
        let (status, body) = post_chat(state.clone(), bad).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Invalid message"}));
    }
}

#[tokio::test]
async fn boundary_lengths_are_accepted() {
    let state = state_with(ScriptedGenerator::from_texts([
        INCIDENT,
        r#"{"action":"clarify","question":"Which endpoint?"}"#,
    ]));
    let (status, body) = post_chat(
        state,
        json!({"sessionId": "s".repeat(128), "message": "m".repeat(4000)}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], "Which endpoint?");
}

#[tokio::test]
async fn successful_turn_returns_reply_and_profile() {
    let state = state_with(ScriptedGenerator::from_texts([
        INCIDENT,
        r#"{"action":"clarify","question":"Which region is affected?"}"#,
    ]));
    let (status, body) = post_chat(
        state,
        json!({"sessionId": " s1 ", "message": " pages are slow "}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "reply": "Which region is affected?",
            "profile": {"techStack": [], "domain": "", "notes": ""}
        })
    );
}

#[tokio::test]
async fn storage_failure_maps_to_bad_gateway() {
    let state = state_with_store(
        ScriptedGenerator::from_texts([
            INCIDENT,
            r#"{"action":"clarify","question":"Which region is affected?"}"#,
        ]),
        Arc::new(ReadOnlyStore),
    );
    let (status, body) = post_chat(state, json!({"sessionId": "s1", "message": "down"})).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(
        body,
        json!({
            "error": "Session handler error",
            "details": "storage: query failed: disk full"
        })
    );
}

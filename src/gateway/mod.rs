//! Axum-based HTTP front door for the session controller.
//!
//! - `POST /api/chat` validates `{sessionId, message}` and runs one turn
//! - `GET /health` liveness probe
//! - permissive CORS on every response, `OPTIONS` preflight answered with 204
//! - request body size limit (64KB) and a request timeout

mod cors;
mod handlers;
mod server;

pub use server::{build_app, is_public_bind, run_gateway, run_gateway_with_listener};

use crate::session::SessionController;
use std::sync::Arc;

/// Maximum request body size (64KB) -- prevents memory exhaustion
pub const MAX_BODY_SIZE: usize = 65_536;
/// Request timeout (180s) -- one turn may chain several generation calls
pub const REQUEST_TIMEOUT_SECS: u64 = 180;

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<SessionController>,
}

#[cfg(test)]
mod tests;

//! HTTP handlers.
//!
//! [`dispatch_event`] is the single inbound-event handler: every method and
//! path not claimed by an operational probe lands here and is dispatched to
//! the handler module. The probes report process and module state.

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::response::IntoResponse;
use tracing::warn;

use edge_dispatch_core::{FailureSignal, failure_response};

use crate::request::from_parts;
use crate::response::into_axum_response;
use crate::state::AppState;

/// Upper bound on buffered request bodies (8 MiB).
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Handle one inbound event.
///
/// By the time this future is handed to the runtime, the commitment to
/// produce a response for the event is made; the dispatcher guarantees it
/// resolves to exactly one response no matter what the module does.
pub async fn dispatch_event(
    State(state): State<AppState>,
    request: Request<Body>,
) -> impl IntoResponse {
    let (parts, body) = request.into_parts();

    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "Failed to buffer request body");
            let signal = FailureSignal::message(format!("request body read failed: {e}"));
            return into_axum_response(failure_response(&signal));
        }
    };

    let edge_request = from_parts(&parts, bytes);
    let response = state.dispatcher().dispatch(edge_request).await;

    into_axum_response(response)
}

/// Health check handler.
///
/// Returns 200 OK if the server is running.
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Readiness check handler.
///
/// Reports the module cell's state. Initialization is lazy, so
/// "uninitialized" before the first event is the normal cold-start state.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    // Poke the engine to verify it is responsive
    state.engine().increment_epoch();

    let loader = state.loader();
    let module_state = if loader.is_ready() {
        "ready"
    } else if loader.is_initialized() {
        "failed"
    } else {
        "uninitialized"
    };

    let body = serde_json::json!({
        "status": "ready",
        "module": module_state,
        "init_attempts": loader.init_attempts(),
    });

    (StatusCode::OK, axum::Json(body))
}

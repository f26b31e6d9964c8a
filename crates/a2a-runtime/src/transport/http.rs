//! Stateless HTTP binding of the envelope schema
//!
//! `POST /a2a/message` accepts a request envelope and answers with the
//! outbound envelope: HTTP 200 for a response, and the error-code mapping
//! (400/404/422/502/504) for an error. Equivalent to the WebSocket binding,
//! minus the persistent connection.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::Value;
use tracing::warn;

use a2a_core::{ErrorCode, MessageType, codec};

use crate::router::CapabilityRouter;

/// Build the HTTP surface over a capability router
pub fn http_app(router: Arc<CapabilityRouter>) -> Router {
    Router::new()
        .route("/a2a/message", post(post_message))
        .route("/health", get(health))
        .with_state(router)
}

async fn health() -> &'static str {
    "ok"
}

fn status_for(envelope: &a2a_core::Envelope) -> StatusCode {
    if envelope.message_type != MessageType::Error {
        return StatusCode::OK;
    }
    let code: Option<ErrorCode> =
        serde_json::from_value(envelope.payload["error_code"].clone()).ok();
    let status = code
        .map(|c| c.http_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR.as_u16());
    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

async fn post_message(
    State(router): State<Arc<CapabilityRouter>>,
    Json(body): Json<Value>,
) -> Response {
    // Re-run the codec on the body so the HTTP surface enforces exactly the
    // same envelope validation as the socket one.
    let envelope = match codec::decode(body.to_string().as_bytes()) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(error = %e, "undecodable http message");
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error_code": ErrorCode::InvalidMessage,
                    "error_message": e.to_string(),
                    "original_request": body,
                })),
            )
                .into_response();
        }
    };

    match router.dispatch(envelope).await {
        Some(reply) => {
            let status = status_for(&reply);
            (status, Json(reply)).into_response()
        }
        // Inbound response/error envelopes resolve correlation and carry no
        // reply body.
        None => StatusCode::ACCEPTED.into_response(),
    }
}

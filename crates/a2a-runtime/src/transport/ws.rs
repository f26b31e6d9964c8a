//! WebSocket endpoint serving one capability
//!
//! Each capability is served on its own listening endpoint. Text frames
//! carry envelope JSON; every inbound frame is decoded and dispatched on
//! its own task, so a connection can keep many requests in flight, and
//! replies are funneled through a single writer task per connection.

use std::sync::Arc;

use chrono::Utc;
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use a2a_core::payload::ErrorPayload;
use a2a_core::{Capability, Envelope, ErrorCode, MessageType, Priority, codec, envelope};

use crate::error::{Result, RuntimeError};
use crate::router::CapabilityRouter;

/// Error envelope for bytes that never decoded into an envelope
///
/// There is nothing to correlate to, so `correlation_id` stays empty and
/// the raw text is echoed back as the offending request.
fn undecodable_reply(capability: Capability, raw: &str, error: &str) -> Envelope {
    Envelope {
        message_id: envelope::new_message_id(),
        sender_id: capability.default_agent_id().to_string(),
        receiver_id: "unknown".to_string(),
        message_type: MessageType::Error,
        priority: Priority::High,
        timestamp: Utc::now(),
        payload: serde_json::to_value(ErrorPayload {
            error_code: ErrorCode::InvalidMessage,
            error_message: error.to_string(),
            original_request: json!(raw),
        })
        .unwrap_or(serde_json::Value::Null),
        correlation_id: None,
        expires_at: None,
    }
}

/// Accept connections on `listener` and serve `capability` through `router`
///
/// Runs until the listener fails; spawn it once per capability endpoint.
pub async fn serve_ws(
    listener: TcpListener,
    router: Arc<CapabilityRouter>,
    capability: Capability,
) -> Result<()> {
    info!(
        capability = %capability,
        addr = ?listener.local_addr().ok(),
        "websocket endpoint listening"
    );
    loop {
        let (stream, peer) = listener
            .accept()
            .await
            .map_err(|e| RuntimeError::Connection(e.to_string()))?;
        debug!(capability = %capability, peer = %peer, "connection accepted");
        let router = router.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, router, capability).await {
                warn!(capability = %capability, peer = %peer, error = %e, "connection closed with error");
            }
        });
    }
}

async fn handle_connection(
    stream: TcpStream,
    router: Arc<CapabilityRouter>,
    capability: Capability,
) -> Result<()> {
    let ws = accept_async(stream)
        .await
        .map_err(|e| RuntimeError::Connection(e.to_string()))?;
    let (mut writer, mut reader) = ws.split();

    // Single writer task; dispatch tasks feed it through the channel.
    let (tx, mut rx) = mpsc::channel::<String>(64);
    let writer_task = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if writer.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = reader.next().await {
        let frame = frame.map_err(|e| RuntimeError::Connection(e.to_string()))?;
        let text = match frame {
            Message::Text(text) => text,
            Message::Binary(bytes) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(_) => {
                    warn!(capability = %capability, "non-utf8 binary frame dropped");
                    continue;
                }
            },
            Message::Close(_) => break,
            // Ping/pong handled by tungstenite itself.
            _ => continue,
        };

        let envelope = match codec::decode(text.as_bytes()) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(capability = %capability, error = %e, "undecodable frame");
                let reply = undecodable_reply(capability, &text, &e.to_string());
                if let Ok(encoded) = codec::encode(&reply) {
                    let _ = tx.send(encoded).await;
                }
                continue;
            }
        };

        // Dispatch concurrently so one slow analysis does not block the
        // connection's other in-flight requests.
        let router = router.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            if let Some(reply) = router.dispatch(envelope).await {
                match codec::encode(&reply) {
                    Ok(encoded) => {
                        let _ = tx.send(encoded).await;
                    }
                    Err(e) => warn!(error = %e, "reply encoding failed"),
                }
            }
        });
    }

    drop(tx);
    let _ = writer_task.await;
    Ok(())
}

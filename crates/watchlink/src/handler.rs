//! Per-connection handler: registration, writer task, read loop,
//! heartbeat, and cleanup.
//!
//! Each accepted connection gets its own Tokio task running this
//! handler. The flow is:
//!   1. Register with the client registry → the client is told its id
//!   2. Spawn a writer task draining the client's outbound channel
//!   3. Loop: receive frames → decode → dispatch; probe liveness on an
//!      interval
//!   4. On exit (close, error, or timeout): run disconnect cleanup on
//!      both directories, then unregister

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;

use watchlink_protocol::{ClientMessage, Codec};
use watchlink_transport::{Connection, Incoming, WebSocketConnection};

use crate::RelayError;
use crate::router;
use crate::server::ServerState;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) -> Result<(), RelayError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let (tx, mut rx) = mpsc::unbounded_channel();
    let client_id = state.registry.lock().await.register(tx);

    // Writer task: everything addressed to this client funnels through
    // the unbounded channel, so a slow socket here never blocks the
    // directories or other clients' traffic.
    let conn = Arc::new(conn);
    let writer = {
        let conn = Arc::clone(&conn);
        let codec = state.codec;
        let client_id = client_id.clone();
        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                let text = match codec.encode(&message) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!(
                            %client_id,
                            error = %e,
                            "failed to encode outbound message"
                        );
                        continue;
                    }
                };
                if conn.send(&text).await.is_err() {
                    break;
                }
            }
        })
    };

    let mut last_seen = Instant::now();
    let mut probe = tokio::time::interval(state.heartbeat.ping_interval());

    loop {
        tokio::select! {
            _ = probe.tick() => {
                if last_seen.elapsed() > state.heartbeat.timeout() {
                    tracing::info!(
                        %client_id,
                        "connection timed out, treating as closed"
                    );
                    break;
                }
                if conn.ping().await.is_err() {
                    break;
                }
            }

            incoming = conn.recv() => match incoming {
                Ok(Some(Incoming::Pong)) => {
                    last_seen = Instant::now();
                }
                Ok(Some(Incoming::Frame(text))) => {
                    last_seen = Instant::now();
                    // Malformed frames are dropped here so one bad
                    // message can never take down the handling loop or
                    // leak into unrelated rooms.
                    let message: ClientMessage =
                        match state.codec.decode(&text) {
                            Ok(message) => message,
                            Err(e) => {
                                tracing::debug!(
                                    %client_id,
                                    error = %e,
                                    "malformed message dropped"
                                );
                                continue;
                            }
                        };
                    router::dispatch(&state, &client_id, message).await;
                }
                Ok(None) => {
                    tracing::info!(%client_id, "connection closed cleanly");
                    break;
                }
                Err(e) => {
                    tracing::debug!(%client_id, error = %e, "recv error");
                    break;
                }
            }
        }
    }

    // Cleanup runs on every exit path and is idempotent: a heartbeat
    // timeout racing an explicit leave resolves to one effective leave.
    router::handle_disconnect(&state, &client_id).await;
    state.registry.lock().await.unregister(&client_id);
    writer.abort();
    let _ = conn.close().await;

    Ok(())
}

//! `RelayServer` builder and accept loop.
//!
//! This is the entry point for running a Watchlink relay. It ties the
//! layers together: transport → protocol → registry → directories.

use std::sync::Arc;

use tokio::sync::Mutex;

use watchlink_pairing::PairingDirectory;
use watchlink_protocol::JsonCodec;
use watchlink_registry::{ClientRegistry, HeartbeatConfig};
use watchlink_room::RoomDirectory;
use watchlink_transport::{Transport, WebSocketTransport};

use crate::RelayError;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
///
/// The registries are the only shared mutable resources in the process.
/// Each sits behind its own `Mutex`, and every operation on one runs to
/// completion while the lock is held — the multi-threaded equivalent of
/// single-threaded run-to-completion handling. Deliveries happen after
/// the directory lock is dropped.
pub(crate) struct ServerState {
    pub(crate) registry: Mutex<ClientRegistry>,
    pub(crate) rooms: Mutex<RoomDirectory>,
    pub(crate) pairings: Mutex<PairingDirectory>,
    pub(crate) codec: JsonCodec,
    pub(crate) heartbeat: HeartbeatConfig,
}

/// Builder for configuring and starting a relay server.
///
/// # Example
///
/// ```rust,no_run
/// use watchlink::prelude::*;
///
/// # async fn run() -> Result<(), RelayError> {
/// let server = RelayServerBuilder::new()
///     .bind("0.0.0.0:9160")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct RelayServerBuilder {
    bind_addr: String,
    heartbeat: HeartbeatConfig,
}

impl RelayServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:9160".to_string(),
            heartbeat: HeartbeatConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the heartbeat configuration.
    pub fn heartbeat(mut self, config: HeartbeatConfig) -> Self {
        self.heartbeat = config;
        self
    }

    /// Binds the listener and assembles the server state.
    pub async fn build(self) -> Result<RelayServer, RelayError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            registry: Mutex::new(ClientRegistry::new()),
            rooms: Mutex::new(RoomDirectory::new()),
            pairings: Mutex::new(PairingDirectory::new()),
            codec: JsonCodec,
            heartbeat: self.heartbeat,
        });

        Ok(RelayServer { transport, state })
    }
}

impl Default for RelayServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running relay server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct RelayServer {
    transport: WebSocketTransport,
    state: Arc<ServerState>,
}

impl RelayServer {
    /// Creates a new builder.
    pub fn builder() -> RelayServerBuilder {
        RelayServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop.
    ///
    /// Each accepted connection gets its own handler task; a connection
    /// failing never affects the loop or other connections. Runs until
    /// the process is terminated.
    pub async fn run(mut self) -> Result<(), RelayError> {
        tracing::info!("Watchlink relay running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection(conn, state).await
                        {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

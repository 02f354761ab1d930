//! Transport abstraction layer for Watchlink.
//!
//! Provides the [`Transport`] and [`Connection`] traits that hide the
//! network protocol from the relay core. The server and the directories
//! only ever see text frames and connection ids; the WebSocket details
//! stay behind this seam.
//!
//! # Feature Flags
//!
//! - `websocket` (default) — WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;

/// Opaque identifier for a transport-level connection.
///
/// This is distinct from the protocol's client id: it exists before the
/// registry has assigned one and is only used for transport logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Something received from the remote peer.
///
/// Pongs are surfaced rather than swallowed because the handler's
/// liveness tracking counts them: a client that is idle but answering
/// pings must not be treated as dead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// A complete text frame.
    Frame(String),
    /// A pong answering one of our pings. Carries no data.
    Pong,
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// A single connection that can send and receive text frames.
///
/// Send and receive sides are independently locked, so one task may sit
/// in [`recv`](Connection::recv) while another sends.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends a text frame to the remote peer.
    async fn send(&self, text: &str) -> Result<(), Self::Error>;

    /// Sends a liveness probe.
    async fn ping(&self) -> Result<(), Self::Error>;

    /// Receives the next frame or pong from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Incoming>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}

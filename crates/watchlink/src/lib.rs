//! # Watchlink
//!
//! Realtime relay server for a browser media client: synchronized
//! "watch together" rooms and phone-as-remote pairing with a smart-TV
//! instance of the same client.
//!
//! The server holds all session state in memory and ties the layers
//! together: transport → protocol → registry → directories.
//!
//! ```text
//! frames ──→ handler ──→ router ──→ RoomDirectory / PairingDirectory
//!              ▲                          │ addressed messages
//!              │ heartbeat probes         ▼
//!              └────────────────── ClientRegistry ──→ guarded fan-out
//! ```
//!
//! One handler task per connection; the directories are plain state
//! machines behind mutexes and never touch a socket.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use watchlink::prelude::*;
//!
//! # async fn run() -> Result<(), RelayError> {
//! let server = RelayServerBuilder::new()
//!     .bind("0.0.0.0:9160")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod router;
mod server;

pub use error::RelayError;
pub use server::{RelayServer, RelayServerBuilder};

/// The common imports for running or talking to a relay server.
pub mod prelude {
    pub use crate::{RelayError, RelayServer, RelayServerBuilder};
    pub use watchlink_protocol::{
        ChatBody, ChatMessage, ClientId, ClientMessage, Codec, JsonCodec,
        MediaItem, Participant, PlaybackState, PlaybackStatus, RoomCode,
        RoomSnapshot, ServerMessage,
    };
    pub use watchlink_registry::HeartbeatConfig;
}

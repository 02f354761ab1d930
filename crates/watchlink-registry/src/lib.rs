//! Connection registry for Watchlink.
//!
//! This crate owns the mapping from client identifiers to live outbound
//! channels:
//!
//! 1. **Identity** — every new connection gets a collision-free opaque
//!    client id ([`ClientRegistry::register`]) and is told about it
//!    immediately.
//! 2. **Delivery** — all server → client traffic funnels through guarded
//!    sends here ([`ClientRegistry::send`]); dead recipients are skipped,
//!    never propagated as errors into room or pairing logic.
//! 3. **Liveness tuning** — [`HeartbeatConfig`] carries the ping interval
//!    and timeout the connection handler probes with.
//!
//! The directories above (rooms, pairings) never hold a socket or a
//! channel — only `ClientId`s. The registry is the single place a client
//! id turns back into something sendable, which is what makes disconnect
//! cleanup safe: once a client is unregistered, deliveries addressed to
//! it fall on the floor harmlessly.

mod config;
mod registry;

pub use config::HeartbeatConfig;
pub use registry::{ClientRegistry, ClientSender};

//! Wire protocol for Watchlink.
//!
//! This crate defines the language that clients and the relay server speak:
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`RoomSnapshot`],
//!   etc.) — the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to and from text frames.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while encoding or
//!   decoding.
//!
//! The protocol layer sits between transport (raw frames) and the
//! directories (rooms, pairings). It knows nothing about connections or
//! room membership — only message shapes.
//!
//! Every message is a JSON object of the form
//! `{ "type": "<kebab-case tag>", "payload": { ... } }`; messages without
//! a payload omit the `payload` key entirely. Both enums here are closed
//! tagged unions: an unknown `type` fails to decode at the boundary and
//! never reaches handler logic.

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    ChatBody, ChatMessage, ClientId, ClientMessage, MediaItem, Participant,
    PlaybackState, PlaybackStatus, RoomCode, RoomSnapshot, ServerMessage,
};

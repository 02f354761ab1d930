//! Core protocol types for Watchlink's wire format.
//!
//! Everything here is serialized to JSON text, sent over the socket, and
//! deserialized on the other side. The two top-level enums are
//! [`ClientMessage`] (client → server) and [`ServerMessage`] (server →
//! client); all remaining types are payload pieces they carry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque catalog item, passed through the relay untouched.
///
/// The server never interprets media payloads — it stores whatever the
/// creating client sent and replays it in every room snapshot.
pub type MediaItem = serde_json::Value;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a connected client.
///
/// Newtype over the server-generated identifier string. Wrapping it keeps
/// client ids from being confused with room codes or display names in
/// function signatures, and `#[serde(transparent)]` keeps the wire shape a
/// plain JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub String);

impl ClientId {
    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ClientId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A six-character room code, unique among live rooms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(pub String);

impl RoomCode {
    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RoomCode {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Playback
// ---------------------------------------------------------------------------

/// What the room's shared player is currently doing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    Playing,
    Paused,
    /// Nothing has been started yet. Initial state of every room.
    #[default]
    Idle,
}

/// The authoritative playback state of a room.
///
/// Only the host may replace it; position moves only through host-driven
/// updates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub status: PlaybackStatus,
    /// Position in seconds. Never negative.
    pub time: f64,
}

impl PlaybackState {
    /// Returns a copy with the position clamped to be non-negative.
    /// A NaN position collapses to zero as well.
    pub fn clamped(mut self) -> Self {
        self.time = self.time.max(0.0);
        self
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            status: PlaybackStatus::Idle,
            time: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Participants and chat
// ---------------------------------------------------------------------------

/// One member of a room, as shown in snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub client_id: ClientId,
    pub username: String,
}

/// The body of an inbound `chat-message`: text, an image, or both.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChatBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl ChatBody {
    /// Returns `true` if the body carries at least one of text or image.
    /// Whitespace-only text does not count.
    pub fn has_content(&self) -> bool {
        self.text.as_deref().is_some_and(|t| !t.trim().is_empty())
            || self.image.as_deref().is_some_and(|i| !i.is_empty())
    }
}

/// A single chat entry. Immutable once appended; the sender's display
/// name is captured at send time and never re-resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Server-assigned, monotonically increasing within a room.
    pub id: u64,
    pub sender_id: ClientId,
    pub sender_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Unix milliseconds, server clock.
    pub timestamp: u64,
}

// ---------------------------------------------------------------------------
// Room snapshot
// ---------------------------------------------------------------------------

/// The full authoritative state of a room, as delivered in `room-update`.
///
/// `is_host` is per-recipient: the broadcast loop composes one snapshot
/// per participant so each client learns its own authority, which is why
/// a room update is a fan-out of individual sends rather than one shared
/// payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub room_id: RoomCode,
    pub host_id: ClientId,
    /// All members in join order.
    pub participants: Vec<Participant>,
    pub selected_media: MediaItem,
    pub playback_state: PlaybackState,
    pub chat_history: Vec<ChatMessage>,
    pub is_host: bool,
}

// ---------------------------------------------------------------------------
// Client → server messages
// ---------------------------------------------------------------------------

/// Every message a client may send, as a closed tagged union.
///
/// `#[serde(tag = "type", content = "payload")]` produces the wire shape
/// `{ "type": "join-room", "payload": { "roomId": ... } }`. A frame whose
/// `type` is not listed here fails to decode and is dropped at the
/// boundary — handlers never see untyped payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Open a new room around a catalog item. `media` is decoded as
    /// optional so a missing field reaches validation instead of being a
    /// decode error with no reply.
    CreateRoom {
        media: Option<MediaItem>,
        username: String,
    },

    #[serde(rename_all = "camelCase")]
    JoinRoom { room_id: RoomCode, username: String },

    #[serde(rename_all = "camelCase")]
    LeaveRoom { room_id: RoomCode },

    /// Host-only: replace the room's playback state wholesale.
    #[serde(rename_all = "camelCase")]
    PlaybackControl {
        room_id: RoomCode,
        playback_state: PlaybackState,
    },

    #[serde(rename_all = "camelCase")]
    ChatMessage { room_id: RoomCode, message: ChatBody },

    /// Host-only: hand playback authority to another participant.
    #[serde(rename_all = "camelCase")]
    TransferHost {
        room_id: RoomCode,
        new_host_id: ClientId,
    },

    /// A TV announces itself as controllable. Carries no payload; the
    /// caller's own client id becomes the slave id.
    RegisterSlave,

    /// A phone claims the remote-control role for a TV.
    #[serde(rename_all = "camelCase")]
    RegisterMaster { slave_id: ClientId },

    /// Master → slave control command. `command` is opaque to the server;
    /// any additional fields are captured and forwarded untouched.
    #[serde(rename_all = "camelCase")]
    RemoteCommand {
        slave_id: ClientId,
        command: String,
        #[serde(flatten)]
        extra: serde_json::Map<String, serde_json::Value>,
    },

    /// Slave → master status report. All fields besides the slave id are
    /// opaque and forwarded untouched.
    #[serde(rename_all = "camelCase")]
    SlaveStatusUpdate {
        slave_id: ClientId,
        #[serde(flatten)]
        status: serde_json::Map<String, serde_json::Value>,
    },
}

// ---------------------------------------------------------------------------
// Server → client messages
// ---------------------------------------------------------------------------

/// Every message the server may send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// First message on every connection: the assigned client id.
    #[serde(rename_all = "camelCase")]
    Connected { client_id: ClientId },

    /// Full authoritative room state, personalized per recipient.
    RoomUpdate(RoomSnapshot),

    /// Playback delta only — sent instead of a full snapshot when the
    /// host changes playback state.
    #[serde(rename_all = "camelCase")]
    PlaybackUpdate { playback_state: PlaybackState },

    /// An operation failed; delivered to the offending client only.
    Error { message: String },

    /// Reply to `register-slave`: the id to encode into a pairing QR code.
    #[serde(rename_all = "camelCase")]
    SlaveRegistered { slave_id: ClientId },

    /// Pairing succeeded. Sent to both ends of the new link.
    MasterConnected,

    /// A forwarded control command, delivered to the slave.
    RemoteCommandReceived {
        command: String,
        #[serde(flatten)]
        extra: serde_json::Map<String, serde_json::Value>,
    },

    /// A forwarded status report, delivered to the master.
    SlaveStatusUpdate {
        #[serde(flatten)]
        status: serde_json::Map<String, serde_json::Value>,
    },

    /// The paired TV went away; its pairing is gone.
    SlaveDisconnected,
}

// =========================================================================
// Tests
// =========================================================================

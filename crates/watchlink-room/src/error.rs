//! Error types for room operations.
//!
//! Each of these renders into an `error{message}` frame for the caller;
//! none of them is fatal to the connection or the server. Operations
//! that are silent no-ops (non-host playback control, non-host
//! transfer, chat from a non-participant) do not produce errors at all —
//! they return empty delivery lists instead.

use watchlink_protocol::RoomCode;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No live room has this code.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// Another participant already uses this display name
    /// (case-insensitively).
    #[error("username {0:?} is already taken in this room")]
    NameTaken(String),

    /// The caller is not a participant of the room it addressed.
    #[error("not a participant of room {0}")]
    Unauthorized(RoomCode),

    /// A required field is missing or empty.
    #[error("invalid payload: {0}")]
    InvalidPayload(&'static str),

    /// The caller already belongs to a room; a connection holds at most
    /// one membership.
    #[error("already in room {0}")]
    AlreadyInRoom(RoomCode),
}

//! Room directory: creates, tracks, and mutates every live room.

use std::collections::HashMap;

use rand::Rng;

use watchlink_protocol::{
    ChatBody, ClientId, MediaItem, PlaybackState, RoomCode, ServerMessage,
};

use crate::{Room, RoomError};

/// Alphabet for room codes. Ambiguous glyphs (I, L, O, 0, 1) are left
/// out so codes survive being read off a TV screen.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
const CODE_LEN: usize = 6;

/// Owns all live rooms and the member → room index.
///
/// Constructed once at process start and handed to the router by
/// reference; there is no ambient global state. Every operation takes
/// the invoking client's id explicitly — authorization is a check
/// against the addressed room's current state, looked up fresh per
/// call, never a cached flag.
pub struct RoomDirectory {
    /// Live rooms, keyed by room code.
    rooms: HashMap<RoomCode, Room>,

    /// Maps each member to the room it is in. A client can be in at
    /// most ONE room at a time (key invariant).
    memberships: HashMap<ClientId, RoomCode>,
}

impl RoomDirectory {
    /// Creates a new, empty directory.
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
            memberships: HashMap::new(),
        }
    }

    /// Opens a new room with the caller as host and sole participant.
    ///
    /// Playback starts at `{idle, 0}` with an empty chat; the caller
    /// learns the generated room code from the full-state broadcast.
    pub fn create(
        &mut self,
        caller: &ClientId,
        media: Option<MediaItem>,
        username: &str,
    ) -> Result<Vec<(ClientId, ServerMessage)>, RoomError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(RoomError::InvalidPayload(
                "username must not be empty",
            ));
        }
        let media = media
            .filter(|m| !m.is_null())
            .ok_or(RoomError::InvalidPayload("media must be provided"))?;
        if let Some(code) = self.memberships.get(caller) {
            return Err(RoomError::AlreadyInRoom(code.clone()));
        }

        let code = self.generate_code();
        let room = Room::new(
            code.clone(),
            caller.clone(),
            username.to_owned(),
            media,
        );
        let deliveries = room.broadcast_update();

        self.rooms.insert(code.clone(), room);
        self.memberships.insert(caller.clone(), code.clone());

        tracing::info!(room = %code, host = %caller, "room created");
        Ok(deliveries)
    }

    /// Adds the caller to an existing room. The host is unchanged; all
    /// participants receive a personalized full-state broadcast.
    pub fn join(
        &mut self,
        caller: &ClientId,
        code: &RoomCode,
        username: &str,
    ) -> Result<Vec<(ClientId, ServerMessage)>, RoomError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(RoomError::InvalidPayload(
                "username must not be empty",
            ));
        }

        let room = self
            .rooms
            .get_mut(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;

        if let Some(current) = self.memberships.get(caller) {
            return Err(RoomError::AlreadyInRoom(current.clone()));
        }
        if room.name_taken(username) {
            return Err(RoomError::NameTaken(username.to_owned()));
        }

        room.add_participant(caller.clone(), username.to_owned());
        self.memberships.insert(caller.clone(), code.clone());

        tracing::info!(
            room = %code,
            client_id = %caller,
            participants = room.participant_count(),
            "participant joined"
        );
        Ok(room.broadcast_update())
    }

    /// Removes the caller from a room it belongs to.
    pub fn leave(
        &mut self,
        caller: &ClientId,
        code: &RoomCode,
    ) -> Result<Vec<(ClientId, ServerMessage)>, RoomError> {
        let room = self
            .rooms
            .get(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        if !room.is_participant(caller) {
            return Err(RoomError::Unauthorized(code.clone()));
        }
        Ok(self.remove_member(caller, code))
    }

    /// Host-only: replaces the playback state wholesale and broadcasts
    /// only the playback delta. Anything from a non-host is silently
    /// ignored — no error, no broadcast, no state change.
    pub fn update_playback(
        &mut self,
        caller: &ClientId,
        code: &RoomCode,
        state: PlaybackState,
    ) -> Vec<(ClientId, ServerMessage)> {
        let Some(room) = self.rooms.get_mut(code) else {
            return Vec::new();
        };
        if !room.is_host(caller) {
            tracing::debug!(
                room = %code,
                client_id = %caller,
                "playback-control from non-host ignored"
            );
            return Vec::new();
        }

        room.set_playback(state.clamped());
        room.broadcast_playback()
    }

    /// Appends a chat message and rebroadcasts the full room state.
    ///
    /// Non-participants are silently ignored; a body with neither text
    /// nor image is rejected back to the caller.
    pub fn post_chat(
        &mut self,
        caller: &ClientId,
        code: &RoomCode,
        body: ChatBody,
    ) -> Result<Vec<(ClientId, ServerMessage)>, RoomError> {
        let Some(room) = self.rooms.get_mut(code) else {
            return Ok(Vec::new());
        };
        if !room.is_participant(caller) {
            return Ok(Vec::new());
        }
        if !body.has_content() {
            return Err(RoomError::InvalidPayload(
                "chat message requires text or an image",
            ));
        }

        room.append_chat(caller, body);
        Ok(room.broadcast_update())
    }

    /// Host-only: hands authority to another current participant.
    /// Silently ignored unless both conditions hold.
    pub fn transfer_host(
        &mut self,
        caller: &ClientId,
        code: &RoomCode,
        new_host: &ClientId,
    ) -> Vec<(ClientId, ServerMessage)> {
        let Some(room) = self.rooms.get_mut(code) else {
            return Vec::new();
        };
        if !room.is_host(caller) || !room.is_participant(new_host) {
            tracing::debug!(
                room = %code,
                client_id = %caller,
                "transfer-host ignored"
            );
            return Vec::new();
        }

        room.set_host(new_host.clone());
        tracing::info!(room = %code, host = %new_host, "host transferred");
        room.broadcast_update()
    }

    /// Transport-close cleanup: equivalent to leaving whatever room the
    /// client was in. Infallible and idempotent — a second invocation
    /// for the same client finds no membership and does nothing.
    pub fn handle_disconnect(
        &mut self,
        client: &ClientId,
    ) -> Vec<(ClientId, ServerMessage)> {
        let Some(code) = self.memberships.get(client).cloned() else {
            return Vec::new();
        };
        self.remove_member(client, &code)
    }

    /// Returns the room a client currently belongs to, if any.
    pub fn member_room(&self, client: &ClientId) -> Option<&RoomCode> {
        self.memberships.get(client)
    }

    /// Returns `true` if a live room has this code.
    pub fn contains(&self, code: &RoomCode) -> bool {
        self.rooms.contains_key(code)
    }

    /// Read access to a live room, mainly for tests and introspection.
    pub fn room(&self, code: &RoomCode) -> Option<&Room> {
        self.rooms.get(code)
    }

    /// Returns the number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Shared removal path for leave and disconnect. Deletes emptied
    /// rooms; promotes a replacement when the host departs.
    fn remove_member(
        &mut self,
        client: &ClientId,
        code: &RoomCode,
    ) -> Vec<(ClientId, ServerMessage)> {
        let Some(room) = self.rooms.get_mut(code) else {
            return Vec::new();
        };
        if !room.remove_participant(client) {
            return Vec::new();
        }
        self.memberships.remove(client);

        if room.participant_count() == 0 {
            // Terminal: nobody is left to receive a broadcast.
            self.rooms.remove(code);
            tracing::info!(room = %code, "room closed");
            return Vec::new();
        }

        if !room.is_participant(room.host()) {
            let new_host = room.promote_next_host();
            tracing::info!(
                room = %code,
                host = %new_host,
                "host left, promoted next participant"
            );
        }

        tracing::info!(
            room = %code,
            client_id = %client,
            participants = room.participant_count(),
            "participant left"
        );
        room.broadcast_update()
    }

    /// Generates a room code unique among live rooms.
    fn generate_code(&self) -> RoomCode {
        loop {
            let code = random_code();
            if !self.rooms.contains_key(&code) {
                return code;
            }
        }
    }
}

impl Default for RoomDirectory {
    fn default() -> Self {
        Self::new()
    }
}

fn random_code() -> RoomCode {
    let mut rng = rand::rng();
    let code: String = (0..CODE_LEN)
        .map(|_| {
            CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char
        })
        .collect();
    RoomCode(code)
}

//! The room aggregate: participants, host, playback, chat.

use std::time::{SystemTime, UNIX_EPOCH};

use watchlink_protocol::{
    ChatBody, ChatMessage, ClientId, MediaItem, Participant, PlaybackState,
    RoomCode, RoomSnapshot, ServerMessage,
};

/// One watch-together session.
///
/// Invariants upheld across every mutation:
/// - the host id is always a key of the participant list
/// - display names are pairwise distinct, case-insensitively
/// - chat is append-only; message ids increase monotonically
///
/// A room with zero participants must not exist — the directory deletes
/// it the moment the last participant is removed.
pub struct Room {
    code: RoomCode,
    host: ClientId,
    /// Members in join order. Join order decides host promotion, nothing
    /// else.
    participants: Vec<Participant>,
    selected_media: MediaItem,
    playback: PlaybackState,
    chat: Vec<ChatMessage>,
    next_chat_id: u64,
}

impl Room {
    pub(crate) fn new(
        code: RoomCode,
        host: ClientId,
        username: String,
        media: MediaItem,
    ) -> Self {
        let participants = vec![Participant {
            client_id: host.clone(),
            username,
        }];
        Self {
            code,
            host,
            participants,
            selected_media: media,
            playback: PlaybackState::default(),
            chat: Vec::new(),
            next_chat_id: 1,
        }
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn host(&self) -> &ClientId {
        &self.host
    }

    pub fn is_host(&self, id: &ClientId) -> bool {
        self.host == *id
    }

    pub fn is_participant(&self, id: &ClientId) -> bool {
        self.participants.iter().any(|p| p.client_id == *id)
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Case-insensitive display-name collision check.
    pub fn name_taken(&self, username: &str) -> bool {
        let wanted = username.to_lowercase();
        self.participants
            .iter()
            .any(|p| p.username.to_lowercase() == wanted)
    }

    pub fn playback(&self) -> PlaybackState {
        self.playback
    }

    pub fn chat_len(&self) -> usize {
        self.chat.len()
    }

    pub(crate) fn add_participant(&mut self, id: ClientId, username: String) {
        self.participants.push(Participant {
            client_id: id,
            username,
        });
    }

    /// Removes a participant. Returns `false` if the id was not a member.
    pub(crate) fn remove_participant(&mut self, id: &ClientId) -> bool {
        let before = self.participants.len();
        self.participants.retain(|p| p.client_id != *id);
        self.participants.len() != before
    }

    pub(crate) fn set_host(&mut self, id: ClientId) {
        self.host = id;
    }

    /// Promotes the first remaining participant in join order. No
    /// fairness or seniority guarantee beyond that.
    ///
    /// Must only be called while at least one participant remains.
    pub(crate) fn promote_next_host(&mut self) -> ClientId {
        let next = self.participants[0].client_id.clone();
        self.host = next.clone();
        next
    }

    pub(crate) fn set_playback(&mut self, state: PlaybackState) {
        self.playback = state;
    }

    /// Appends a chat entry with a server-assigned id and timestamp. The
    /// sender's display name is captured now and never re-resolved.
    pub(crate) fn append_chat(&mut self, sender: &ClientId, body: ChatBody) {
        let sender_name = self
            .participants
            .iter()
            .find(|p| p.client_id == *sender)
            .map(|p| p.username.clone())
            .unwrap_or_default();

        let id = self.next_chat_id;
        self.next_chat_id += 1;

        self.chat.push(ChatMessage {
            id,
            sender_id: sender.clone(),
            sender_name,
            text: body.text,
            image: body.image,
            timestamp: unix_millis(),
        });
    }

    /// Composes the full-state snapshot as seen by one recipient.
    pub fn snapshot_for(&self, recipient: &ClientId) -> RoomSnapshot {
        RoomSnapshot {
            room_id: self.code.clone(),
            host_id: self.host.clone(),
            participants: self.participants.clone(),
            selected_media: self.selected_media.clone(),
            playback_state: self.playback,
            chat_history: self.chat.clone(),
            is_host: self.is_host(recipient),
        }
    }

    /// Full-state fan-out: one personalized `room-update` per
    /// participant, so every recipient gets its own `isHost` flag.
    pub(crate) fn broadcast_update(&self) -> Vec<(ClientId, ServerMessage)> {
        self.participants
            .iter()
            .map(|p| {
                (
                    p.client_id.clone(),
                    ServerMessage::RoomUpdate(
                        self.snapshot_for(&p.client_id),
                    ),
                )
            })
            .collect()
    }

    /// Playback-only fan-out. Deliberately not a full snapshot: chat and
    /// the participant list are not resent for playback changes.
    pub(crate) fn broadcast_playback(
        &self,
    ) -> Vec<(ClientId, ServerMessage)> {
        self.participants
            .iter()
            .map(|p| {
                (
                    p.client_id.clone(),
                    ServerMessage::PlaybackUpdate {
                        playback_state: self.playback,
                    },
                )
            })
            .collect()
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn room() -> Room {
        Room::new(
            RoomCode::from("XK4P2N"),
            ClientId::from("a"),
            "Alice".into(),
            json!({"id": 1}),
        )
    }

    #[test]
    fn test_new_room_creator_is_host_and_sole_participant() {
        let room = room();
        assert!(room.is_host(&ClientId::from("a")));
        assert!(room.is_participant(&ClientId::from("a")));
        assert_eq!(room.participant_count(), 1);
        assert_eq!(room.playback(), PlaybackState::default());
        assert_eq!(room.chat_len(), 0);
    }

    #[test]
    fn test_name_taken_is_case_insensitive() {
        let room = room();
        assert!(room.name_taken("alice"));
        assert!(room.name_taken("ALICE"));
        assert!(!room.name_taken("Bob"));
    }

    #[test]
    fn test_snapshot_personalizes_is_host() {
        let mut room = room();
        room.add_participant(ClientId::from("b"), "Bob".into());

        assert!(room.snapshot_for(&ClientId::from("a")).is_host);
        assert!(!room.snapshot_for(&ClientId::from("b")).is_host);
    }

    #[test]
    fn test_chat_ids_are_monotonic() {
        let mut room = room();
        for _ in 0..3 {
            room.append_chat(
                &ClientId::from("a"),
                ChatBody {
                    text: Some("hi".into()),
                    image: None,
                },
            );
        }
        let snapshot = room.snapshot_for(&ClientId::from("a"));
        let ids: Vec<u64> =
            snapshot.chat_history.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_chat_captures_sender_name_at_send_time() {
        let mut room = room();
        room.add_participant(ClientId::from("b"), "Bob".into());
        room.append_chat(
            &ClientId::from("b"),
            ChatBody {
                text: Some("hello".into()),
                image: None,
            },
        );
        // Bob leaves; the recorded name must survive him.
        room.remove_participant(&ClientId::from("b"));

        let snapshot = room.snapshot_for(&ClientId::from("a"));
        assert_eq!(snapshot.chat_history[0].sender_name, "Bob");
    }
}

//! Message router: one dispatch point for every decoded inbound message.
//!
//! Each arm locks exactly the directory it needs, runs the operation to
//! completion, and releases the lock before anything is delivered.
//! Authorization lives inside the directories and is checked against
//! current state on every call — host status can change between two
//! messages from the same connection, so nothing is cached here.

use watchlink_protocol::{ClientId, ClientMessage, ServerMessage};
use watchlink_room::RoomError;

use crate::server::ServerState;

/// Routes one inbound message from `caller` and fans out whatever the
/// directories produced. Never fails: room errors become `error{message}`
/// frames for the caller, pairing rejections are silent.
pub(crate) async fn dispatch(
    state: &ServerState,
    caller: &ClientId,
    message: ClientMessage,
) {
    let deliveries = match message {
        ClientMessage::CreateRoom { media, username } => or_error(
            caller,
            state.rooms.lock().await.create(caller, media, &username),
        ),
        ClientMessage::JoinRoom { room_id, username } => or_error(
            caller,
            state.rooms.lock().await.join(caller, &room_id, &username),
        ),
        ClientMessage::LeaveRoom { room_id } => or_error(
            caller,
            state.rooms.lock().await.leave(caller, &room_id),
        ),
        ClientMessage::PlaybackControl {
            room_id,
            playback_state,
        } => state.rooms.lock().await.update_playback(
            caller,
            &room_id,
            playback_state,
        ),
        ClientMessage::ChatMessage { room_id, message } => or_error(
            caller,
            state.rooms.lock().await.post_chat(caller, &room_id, message),
        ),
        ClientMessage::TransferHost {
            room_id,
            new_host_id,
        } => state.rooms.lock().await.transfer_host(
            caller,
            &room_id,
            &new_host_id,
        ),
        ClientMessage::RegisterSlave => {
            state.pairings.lock().await.register_slave(caller)
        }
        ClientMessage::RegisterMaster { slave_id } => state
            .pairings
            .lock()
            .await
            .register_master(&slave_id, caller),
        ClientMessage::RemoteCommand {
            slave_id,
            command,
            extra,
        } => state.pairings.lock().await.forward_command(
            &slave_id,
            command,
            extra,
            caller,
        ),
        ClientMessage::SlaveStatusUpdate { slave_id, status } => state
            .pairings
            .lock()
            .await
            .forward_status(&slave_id, status, caller),
    };

    if !deliveries.is_empty() {
        state.registry.lock().await.deliver(deliveries);
    }
}

/// Converts a room failure into an error frame for the offending client
/// only. Errors are never broadcast into the room.
fn or_error(
    caller: &ClientId,
    result: Result<Vec<(ClientId, ServerMessage)>, RoomError>,
) -> Vec<(ClientId, ServerMessage)> {
    match result {
        Ok(deliveries) => deliveries,
        Err(e) => vec![(
            caller.clone(),
            ServerMessage::Error {
                message: e.to_string(),
            },
        )],
    }
}

/// Transport-close cleanup. Runs against both directories
/// unconditionally — a connection participates in at most one room and
/// one pairing role, and each cleanup is a cheap no-op when not
/// applicable. Must never raise; both paths are infallible and
/// idempotent by construction.
pub(crate) async fn handle_disconnect(
    state: &ServerState,
    client: &ClientId,
) {
    let mut deliveries =
        state.rooms.lock().await.handle_disconnect(client);
    deliveries
        .extend(state.pairings.lock().await.handle_disconnect(client));

    if !deliveries.is_empty() {
        state.registry.lock().await.deliver(deliveries);
    }
}

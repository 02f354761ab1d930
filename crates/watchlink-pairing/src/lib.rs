//! Remote-control pairing for Watchlink.
//!
//! A "slave" is a TV-mode client that accepts commands; a "master" is
//! the phone controlling it. The directory relays traffic between the
//! two without interpreting it — commands and status reports are opaque
//! payloads, and the only thing checked here is who is allowed to talk
//! to whom.
//!
//! Per-pairing state machine:
//!
//! ```text
//! Unregistered ──register-slave──→ SlaveRegistered
//!                                       │ ▲
//!                       register-master │ │ master disconnects
//!                                       ▼ │
//!                                  MasterLinked ──slave disconnects──→ Gone
//! ```
//!
//! `MasterLinked` is not terminal: the master side can drop and a new
//! phone can take over for as long as the TV stays connected.
//!
//! Unlike room operations, authorization failures here are silent
//! no-ops — a phone probing a wrong slave id simply hears nothing.

use std::collections::HashMap;

use watchlink_protocol::{ClientId, ServerMessage};

/// One slave ↔ master link record.
#[derive(Debug, Clone, Default)]
struct Pairing {
    /// The controlling client, if one has registered. At most one at a
    /// time; a later registration silently replaces an earlier one.
    master: Option<ClientId>,
}

/// Owns every pairing, keyed by slave id (which equals the slave
/// connection's client id).
///
/// Constructed once at process start, like the room directory; all
/// operations take the caller's id explicitly and return addressed
/// messages for the router to fan out.
pub struct PairingDirectory {
    pairings: HashMap<ClientId, Pairing>,

    /// Reverse index: master id → slave id. Kept in sync with
    /// `pairings` so master disconnects don't scan every entry.
    masters: HashMap<ClientId, ClientId>,
}

impl PairingDirectory {
    /// Creates a new, empty directory.
    pub fn new() -> Self {
        Self {
            pairings: HashMap::new(),
            masters: HashMap::new(),
        }
    }

    /// A TV announces itself. The caller's own client id becomes the
    /// slave id, echoed back so the TV can render it as a QR code.
    ///
    /// Re-registration resets the pairing: a reloaded TV starts with no
    /// master, and a stale master link is dropped from the index.
    pub fn register_slave(
        &mut self,
        caller: &ClientId,
    ) -> Vec<(ClientId, ServerMessage)> {
        if let Some(previous) =
            self.pairings.insert(caller.clone(), Pairing::default())
        {
            if let Some(master) = previous.master {
                self.masters.remove(&master);
            }
        }

        tracing::info!(slave = %caller, "slave registered");
        vec![(
            caller.clone(),
            ServerMessage::SlaveRegistered {
                slave_id: caller.clone(),
            },
        )]
    }

    /// A phone claims the remote role for a slave. No-op if no such
    /// pairing exists; on success both ends are notified individually.
    pub fn register_master(
        &mut self,
        slave_id: &ClientId,
        caller: &ClientId,
    ) -> Vec<(ClientId, ServerMessage)> {
        let Some(pairing) = self.pairings.get_mut(slave_id) else {
            tracing::debug!(
                slave = %slave_id,
                master = %caller,
                "register-master for unknown slave ignored"
            );
            return Vec::new();
        };

        // Last registration wins; the displaced master is not told.
        if let Some(previous) = pairing.master.replace(caller.clone()) {
            self.masters.remove(&previous);
            tracing::debug!(
                slave = %slave_id,
                previous = %previous,
                "existing master replaced"
            );
        }
        self.masters.insert(caller.clone(), slave_id.clone());

        tracing::info!(slave = %slave_id, master = %caller, "pairing linked");
        vec![
            (caller.clone(), ServerMessage::MasterConnected),
            (slave_id.clone(), ServerMessage::MasterConnected),
        ]
    }

    /// Relays a control command to the slave, verbatim. No-op unless the
    /// caller is the currently registered master for that slave.
    pub fn forward_command(
        &self,
        slave_id: &ClientId,
        command: String,
        extra: serde_json::Map<String, serde_json::Value>,
        caller: &ClientId,
    ) -> Vec<(ClientId, ServerMessage)> {
        match self.pairings.get(slave_id) {
            Some(pairing) if pairing.master.as_ref() == Some(caller) => {
                vec![(
                    slave_id.clone(),
                    ServerMessage::RemoteCommandReceived { command, extra },
                )]
            }
            _ => {
                tracing::debug!(
                    slave = %slave_id,
                    caller = %caller,
                    "remote-command from non-master dropped"
                );
                Vec::new()
            }
        }
    }

    /// Relays a status report to the master, verbatim. No-op unless the
    /// caller is the registered slave AND a master is currently linked.
    pub fn forward_status(
        &self,
        slave_id: &ClientId,
        status: serde_json::Map<String, serde_json::Value>,
        caller: &ClientId,
    ) -> Vec<(ClientId, ServerMessage)> {
        if slave_id != caller {
            tracing::debug!(
                slave = %slave_id,
                caller = %caller,
                "slave-status-update from non-slave dropped"
            );
            return Vec::new();
        }

        match self
            .pairings
            .get(slave_id)
            .and_then(|pairing| pairing.master.clone())
        {
            Some(master) => {
                vec![(master, ServerMessage::SlaveStatusUpdate { status })]
            }
            None => Vec::new(),
        }
    }

    /// Transport-close cleanup for either role. Idempotent.
    ///
    /// A departing slave takes the whole pairing with it (the master, if
    /// any, is told the TV is gone). A departing master only clears the
    /// link — the slave keeps waiting for a new phone.
    pub fn handle_disconnect(
        &mut self,
        client: &ClientId,
    ) -> Vec<(ClientId, ServerMessage)> {
        let mut deliveries = Vec::new();

        if let Some(pairing) = self.pairings.remove(client) {
            if let Some(master) = pairing.master {
                self.masters.remove(&master);
                deliveries.push((master, ServerMessage::SlaveDisconnected));
            }
            tracing::info!(slave = %client, "pairing removed");
        }

        if let Some(slave) = self.masters.remove(client) {
            if let Some(pairing) = self.pairings.get_mut(&slave) {
                pairing.master = None;
            }
            tracing::info!(
                slave = %slave,
                master = %client,
                "master unlinked, slave stays registered"
            );
        }

        deliveries
    }

    /// Returns `true` if this id has a live pairing as a slave.
    pub fn is_slave(&self, id: &ClientId) -> bool {
        self.pairings.contains_key(id)
    }

    /// Returns the current master of a slave, if linked.
    pub fn master_of(&self, slave_id: &ClientId) -> Option<&ClientId> {
        self.pairings
            .get(slave_id)
            .and_then(|pairing| pairing.master.as_ref())
    }

    /// Returns the number of live pairings.
    pub fn len(&self) -> usize {
        self.pairings.len()
    }

    /// Returns `true` if no pairings exist.
    pub fn is_empty(&self) -> bool {
        self.pairings.is_empty()
    }
}

impl Default for PairingDirectory {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cid(id: &str) -> ClientId {
        ClientId::from(id)
    }

    fn play_command() -> (String, serde_json::Map<String, serde_json::Value>)
    {
        ("play".to_string(), serde_json::Map::new())
    }

    // -- register_slave ---------------------------------------------------

    #[test]
    fn test_register_slave_echoes_slave_id_to_caller() {
        let mut directory = PairingDirectory::new();

        let deliveries = directory.register_slave(&cid("tv"));

        assert_eq!(
            deliveries,
            vec![(
                cid("tv"),
                ServerMessage::SlaveRegistered {
                    slave_id: cid("tv")
                }
            )]
        );
        assert!(directory.is_slave(&cid("tv")));
    }

    #[test]
    fn test_register_slave_again_clears_stale_master() {
        let mut directory = PairingDirectory::new();
        directory.register_slave(&cid("tv"));
        directory.register_master(&cid("tv"), &cid("phone"));

        directory.register_slave(&cid("tv"));

        assert!(directory.master_of(&cid("tv")).is_none());
        // The stale master can no longer drive the TV.
        let (command, extra) = play_command();
        assert!(
            directory
                .forward_command(&cid("tv"), command, extra, &cid("phone"))
                .is_empty()
        );
    }

    // -- register_master --------------------------------------------------

    #[test]
    fn test_register_master_notifies_both_ends() {
        let mut directory = PairingDirectory::new();
        directory.register_slave(&cid("tv"));

        let deliveries =
            directory.register_master(&cid("tv"), &cid("phone"));

        assert_eq!(
            deliveries,
            vec![
                (cid("phone"), ServerMessage::MasterConnected),
                (cid("tv"), ServerMessage::MasterConnected),
            ]
        );
        assert_eq!(directory.master_of(&cid("tv")), Some(&cid("phone")));
    }

    #[test]
    fn test_register_master_for_unknown_slave_is_silent() {
        let mut directory = PairingDirectory::new();

        let deliveries =
            directory.register_master(&cid("nothing"), &cid("phone"));

        assert!(deliveries.is_empty(), "no master-connected may be sent");
    }

    #[test]
    fn test_second_master_silently_replaces_first() {
        let mut directory = PairingDirectory::new();
        directory.register_slave(&cid("tv"));
        directory.register_master(&cid("tv"), &cid("phone-1"));

        let deliveries =
            directory.register_master(&cid("tv"), &cid("phone-2"));

        assert_eq!(directory.master_of(&cid("tv")), Some(&cid("phone-2")));
        // Only the new master and the slave hear about it.
        assert!(
            deliveries.iter().all(|(to, _)| *to != cid("phone-1")),
            "displaced master gets no notification"
        );

        // The displaced master has lost authority.
        let (command, extra) = play_command();
        assert!(
            directory
                .forward_command(&cid("tv"), command, extra, &cid("phone-1"))
                .is_empty()
        );
    }

    // -- forward_command --------------------------------------------------

    #[test]
    fn test_forward_command_reaches_slave_verbatim() {
        let mut directory = PairingDirectory::new();
        directory.register_slave(&cid("tv"));
        directory.register_master(&cid("tv"), &cid("phone"));

        let mut extra = serde_json::Map::new();
        extra.insert("seconds".into(), serde_json::json!(30));
        let deliveries = directory.forward_command(
            &cid("tv"),
            "seek_forward".into(),
            extra.clone(),
            &cid("phone"),
        );

        assert_eq!(
            deliveries,
            vec![(
                cid("tv"),
                ServerMessage::RemoteCommandReceived {
                    command: "seek_forward".into(),
                    extra,
                }
            )]
        );
    }

    #[test]
    fn test_forward_command_from_non_master_is_silent() {
        let mut directory = PairingDirectory::new();
        directory.register_slave(&cid("tv"));
        directory.register_master(&cid("tv"), &cid("phone"));

        let (command, extra) = play_command();
        let deliveries = directory.forward_command(
            &cid("tv"),
            command,
            extra,
            &cid("intruder"),
        );

        assert!(deliveries.is_empty(), "nothing may reach the slave");
    }

    #[test]
    fn test_forward_command_before_any_master_is_silent() {
        let mut directory = PairingDirectory::new();
        directory.register_slave(&cid("tv"));

        let (command, extra) = play_command();
        assert!(
            directory
                .forward_command(&cid("tv"), command, extra, &cid("phone"))
                .is_empty()
        );
    }

    // -- forward_status ---------------------------------------------------

    #[test]
    fn test_forward_status_reaches_master() {
        let mut directory = PairingDirectory::new();
        directory.register_slave(&cid("tv"));
        directory.register_master(&cid("tv"), &cid("phone"));

        let mut status = serde_json::Map::new();
        status.insert("status".into(), serde_json::json!("playing"));
        let deliveries = directory.forward_status(
            &cid("tv"),
            status.clone(),
            &cid("tv"),
        );

        assert_eq!(
            deliveries,
            vec![(
                cid("phone"),
                ServerMessage::SlaveStatusUpdate { status }
            )]
        );
    }

    #[test]
    fn test_forward_status_without_master_is_silent() {
        let mut directory = PairingDirectory::new();
        directory.register_slave(&cid("tv"));

        let deliveries = directory.forward_status(
            &cid("tv"),
            serde_json::Map::new(),
            &cid("tv"),
        );
        assert!(deliveries.is_empty());
    }

    #[test]
    fn test_forward_status_from_impostor_is_silent() {
        let mut directory = PairingDirectory::new();
        directory.register_slave(&cid("tv"));
        directory.register_master(&cid("tv"), &cid("phone"));

        let deliveries = directory.forward_status(
            &cid("tv"),
            serde_json::Map::new(),
            &cid("impostor"),
        );
        assert!(deliveries.is_empty());
    }

    // -- disconnect -------------------------------------------------------

    #[test]
    fn test_slave_disconnect_removes_pairing_and_notifies_master() {
        let mut directory = PairingDirectory::new();
        directory.register_slave(&cid("tv"));
        directory.register_master(&cid("tv"), &cid("phone"));

        let deliveries = directory.handle_disconnect(&cid("tv"));

        assert_eq!(
            deliveries,
            vec![(cid("phone"), ServerMessage::SlaveDisconnected)]
        );
        assert!(!directory.is_slave(&cid("tv")));

        // The former id is gone for good: a new master registration
        // against it stays silent.
        assert!(
            directory
                .register_master(&cid("tv"), &cid("phone-2"))
                .is_empty()
        );
    }

    #[test]
    fn test_master_disconnect_keeps_slave_registered() {
        let mut directory = PairingDirectory::new();
        directory.register_slave(&cid("tv"));
        directory.register_master(&cid("tv"), &cid("phone"));

        let deliveries = directory.handle_disconnect(&cid("phone"));

        assert!(deliveries.is_empty());
        assert!(directory.is_slave(&cid("tv")));
        assert!(directory.master_of(&cid("tv")).is_none());

        // The pairing can cycle back to MasterLinked with a new phone.
        let relink = directory.register_master(&cid("tv"), &cid("phone-2"));
        assert_eq!(relink.len(), 2);
        assert_eq!(directory.master_of(&cid("tv")), Some(&cid("phone-2")));
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let mut directory = PairingDirectory::new();
        directory.register_slave(&cid("tv"));
        directory.register_master(&cid("tv"), &cid("phone"));

        directory.handle_disconnect(&cid("tv"));
        assert!(directory.handle_disconnect(&cid("tv")).is_empty());
        assert!(directory.handle_disconnect(&cid("phone")).is_empty());
        assert!(directory.is_empty());
    }

    #[test]
    fn test_disconnect_of_unrelated_client_is_noop() {
        let mut directory = PairingDirectory::new();
        directory.register_slave(&cid("tv"));

        assert!(directory.handle_disconnect(&cid("viewer")).is_empty());
        assert!(directory.is_slave(&cid("tv")));
    }
}

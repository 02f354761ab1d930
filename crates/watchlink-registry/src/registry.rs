//! The client registry: identity assignment and guarded delivery.
//!
//! # Concurrency note
//!
//! `ClientRegistry` is NOT thread-safe by itself — it is a plain
//! `HashMap` owned by the server layer and accessed through a mutex
//! there. Keeping it synchronous means every registry operation runs to
//! completion with no suspension point, which is what the relay's
//! ordering guarantees rest on.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use tokio::sync::mpsc;

use watchlink_protocol::{ClientId, ServerMessage};

/// Channel sender for delivering outbound messages to one client.
///
/// Unbounded on purpose: a send from a directory must never block on a
/// slow socket. The connection's writer task drains the other end.
pub type ClientSender = mpsc::UnboundedSender<ServerMessage>;

/// Tracks every connected client and its outbound channel.
pub struct ClientRegistry {
    clients: HashMap<ClientId, ClientSender>,
}

impl ClientRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self {
            clients: HashMap::new(),
        }
    }

    /// Assigns a fresh client id to a new connection and stores its
    /// outbound channel.
    ///
    /// The identification message (`connected{clientId}`) is enqueued
    /// before the sender is stored, so it is the first thing the client
    /// ever receives on this channel.
    pub fn register(&mut self, sender: ClientSender) -> ClientId {
        let id = loop {
            let candidate = generate_client_id();
            if !self.clients.contains_key(&candidate) {
                break candidate;
            }
        };

        let _ = sender.send(ServerMessage::Connected {
            client_id: id.clone(),
        });
        self.clients.insert(id.clone(), sender);

        tracing::info!(client_id = %id, "client connected");
        id
    }

    /// Removes a client. Safe to call for ids that are already gone.
    pub fn unregister(&mut self, id: &ClientId) {
        if self.clients.remove(id).is_some() {
            tracing::info!(client_id = %id, "client unregistered");
        }
    }

    /// Sends one message to one client, swallowing failures.
    ///
    /// Unknown recipients and closed channels are logged at debug level
    /// and dropped — a dead client in a fan-out must never affect the
    /// remaining recipients or the caller.
    pub fn send(&self, to: &ClientId, message: ServerMessage) {
        match self.clients.get(to) {
            Some(sender) => {
                if sender.send(message).is_err() {
                    tracing::debug!(
                        client_id = %to,
                        "send to closed channel dropped"
                    );
                }
            }
            None => {
                tracing::debug!(
                    client_id = %to,
                    "send to unknown client dropped"
                );
            }
        }
    }

    /// Delivers a batch of addressed messages, one guarded send each.
    pub fn deliver(
        &self,
        batch: Vec<(ClientId, ServerMessage)>,
    ) {
        for (to, message) in batch {
            self.send(&to, message);
        }
    }

    /// Returns `true` if the id belongs to a registered client.
    pub fn contains(&self, id: &ClientId) -> bool {
        self.clients.contains_key(id)
    }

    /// Returns the number of registered clients.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Returns `true` if no clients are registered.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Generates an opaque client id: millisecond timestamp plus a random
/// 32-bit suffix, both hex. Collisions against live ids are re-rolled by
/// the caller; no persistent counter is needed.
fn generate_client_id() -> ClientId {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let suffix: u32 = rand::rng().random();
    ClientId(format!("{millis:x}-{suffix:08x}"))
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> (
        ClientSender,
        mpsc::UnboundedReceiver<ServerMessage>,
    ) {
        mpsc::unbounded_channel()
    }

    #[test]
    fn test_register_sends_connected_first() {
        let mut registry = ClientRegistry::new();
        let (tx, mut rx) = channel();

        let id = registry.register(tx);

        let first = rx.try_recv().expect("should have a message");
        assert_eq!(
            first,
            ServerMessage::Connected {
                client_id: id.clone()
            }
        );
        assert!(registry.contains(&id));
    }

    #[test]
    fn test_register_assigns_distinct_ids() {
        let mut registry = ClientRegistry::new();
        let (tx1, _rx1) = channel();
        let (tx2, _rx2) = channel();

        let a = registry.register(tx1);
        let b = registry.register(tx2);

        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let mut registry = ClientRegistry::new();
        let (tx, _rx) = channel();
        let id = registry.register(tx);

        registry.unregister(&id);
        registry.unregister(&id);

        assert!(!registry.contains(&id));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_send_to_unknown_client_is_swallowed() {
        let registry = ClientRegistry::new();
        registry.send(
            &ClientId::from("nobody"),
            ServerMessage::MasterConnected,
        );
    }

    #[test]
    fn test_send_to_closed_channel_is_swallowed() {
        let mut registry = ClientRegistry::new();
        let (tx, rx) = channel();
        let id = registry.register(tx);
        drop(rx);

        registry.send(&id, ServerMessage::MasterConnected);
    }

    #[test]
    fn test_deliver_skips_dead_recipient_but_reaches_live_one() {
        let mut registry = ClientRegistry::new();
        let (tx1, rx1) = channel();
        let (tx2, mut rx2) = channel();
        let dead = registry.register(tx1);
        let live = registry.register(tx2);
        drop(rx1);
        let _ = rx2.try_recv(); // drain Connected

        registry.deliver(vec![
            (dead, ServerMessage::MasterConnected),
            (live, ServerMessage::MasterConnected),
        ]);

        assert_eq!(
            rx2.try_recv().expect("live client should receive"),
            ServerMessage::MasterConnected
        );
    }

    #[test]
    fn test_generated_ids_have_timestamp_and_suffix() {
        let id = generate_client_id();
        let (ts, suffix) =
            id.as_str().split_once('-').expect("id should have two parts");
        assert!(u128::from_str_radix(ts, 16).is_ok());
        assert_eq!(suffix.len(), 8);
        assert!(u32::from_str_radix(suffix, 16).is_ok());
    }
}

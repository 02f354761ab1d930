//! Unified error type for the Watchlink server.

use watchlink_protocol::ProtocolError;
use watchlink_transport::TransportError;

/// Top-level error that wraps the crate-specific errors that can escape
/// the server loop.
///
/// Room errors never appear here: the router converts them into
/// `error{message}` frames for the offending client, and pairing
/// failures are silent no-ops by design.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

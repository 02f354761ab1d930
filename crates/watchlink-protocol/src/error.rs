//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding wire messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed. Indicates a server-side bug — every outbound
    /// type is serializable by construction.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, an unknown `type` tag, or
    /// a payload missing required fields. Inbound frames that fail here
    /// are logged and dropped without a client notification.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}

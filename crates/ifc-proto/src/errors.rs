//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while validating or encoding envelopes.
///
/// Every variant describes data that carried our protocol tag (or a call made
/// by local code), so none of them is ever produced for foreign traffic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// `msgType` is not known to this version of the library.
    #[error("unknown message type: {0:?}")]
    UnknownMessageType(String),

    /// `msgType` field missing or not a string.
    #[error("message has no msgType")]
    MissingMessageType,

    /// `direction` field present but not a known direction.
    #[error("invalid direction: {0}")]
    InvalidDirection(String),

    /// Payload does not match the schema selected by `msgType`.
    #[error("invalid {msg_type} payload: {reason}")]
    InvalidPayload {
        /// Wire tag of the message.
        msg_type: &'static str,
        /// Underlying deserialization failure.
        reason: String,
    },

    /// A locally constructed outgoing message failed validation.
    #[error("outgoing {msg_type:?} message rejected: {source}")]
    InvalidOutgoing {
        /// `msgType` given by the caller (may be unknown).
        msg_type: String,
        /// Original validation failure.
        source: Box<ProtocolError>,
    },

    /// Serializing a payload failed.
    #[error("encode failed: {0}")]
    Encode(String),
}

impl ProtocolError {
    /// Returns true if this error points at a peer running an incompatible
    /// library version (rather than at a local programming error).
    pub fn is_version_skew(&self) -> bool {
        match self {
            Self::UnknownMessageType(_)
            | Self::MissingMessageType
            | Self::InvalidDirection(_)
            | Self::InvalidPayload { .. } => true,
            Self::InvalidOutgoing { .. } | Self::Encode(_) => false,
        }
    }
}

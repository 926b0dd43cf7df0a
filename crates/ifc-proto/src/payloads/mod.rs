//! Payload schemas.
//!
//! The `msgType` tag of an envelope selects the payload schema, so payloads
//! are (de)serialized without a variant tag of their own. Each direction has
//! its own closed sum type: [`ClientToHost`] for messages a host receives and
//! [`HostToClient`] for messages a client receives.
//!
//! # Invariants
//!
//! - Each variant maps to exactly one [`MsgType`] (enforced by exhaustive
//!   matches in `msg_type`, `to_payload` and `from_payload`).
//! - `from_payload(m.msg_type(), m.to_payload())` reproduces `m`.
//! - Untyped passthrough fields (`payload`, `custom`, `modalData`) are checked
//!   for presence only.

pub mod input;
pub mod lifecycle;
pub mod pubsub;
pub mod requests;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    Direction, MsgType,
    errors::{ProtocolError, Result},
};

/// A closed set of message kinds travelling in one direction.
pub trait Message: Sized + Clone + std::fmt::Debug {
    /// Direction every message of this type travels in.
    const DIRECTION: Direction;

    /// Wire tag of this message.
    fn msg_type(&self) -> MsgType;

    /// Payload value for the `msg` field. `None` for payload-less kinds.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Encode` if serialization fails
    fn to_payload(&self) -> Result<Option<Value>>;

    /// Decode the payload selected by `msg_type`.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::UnknownMessageType` if `msg_type` does not travel in
    ///   [`Self::DIRECTION`]
    /// - `ProtocolError::InvalidPayload` if `msg` does not match the schema
    fn from_payload(msg_type: MsgType, msg: Value) -> Result<Self>;
}

/// Messages sent by a client to its host.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientToHost {
    /// First message of the lifecycle handshake.
    ClientStarted,
    /// Publication on a topic.
    Publish(pubsub::Publication),
    /// Navigation request.
    NavRequest(requests::NavRequest),
    /// Notification request (also decoded from legacy `toastRequest`).
    NotifyRequest(requests::Notification),
    /// Modal request.
    ModalRequest(requests::ModalRequest),
    /// Page title and breadcrumbs.
    PageMetadata(requests::PageMetadata),
    /// Leave confirmation toggle.
    PromptOnLeave(requests::PromptOnLeave),
    /// Echo of a registered key chord.
    RegisteredKeyFired(input::KeyData),
    /// Click inside the client.
    ClickFired(input::ClickData),
    /// Worker acknowledged an unload request.
    UnloadComplete,
}

/// Messages sent by a host to a client.
#[derive(Debug, Clone, PartialEq)]
pub enum HostToClient {
    /// Publication on a topic.
    Publish(pubsub::Publication),
    /// Environment data, second half of the lifecycle handshake.
    EnvInit(lifecycle::EnvInit),
    /// Cooperative shutdown request for worker clients.
    UnloadRequest,
}

impl Message for ClientToHost {
    const DIRECTION: Direction = Direction::ClientToHost;

    fn msg_type(&self) -> MsgType {
        match self {
            Self::ClientStarted => MsgType::ClientStarted,
            Self::Publish(_) => MsgType::Publish,
            Self::NavRequest(_) => MsgType::NavRequest,
            Self::NotifyRequest(_) => MsgType::NotifyRequest,
            Self::ModalRequest(_) => MsgType::ModalRequest,
            Self::PageMetadata(_) => MsgType::PageMetadata,
            Self::PromptOnLeave(_) => MsgType::PromptOnLeave,
            Self::RegisteredKeyFired(_) => MsgType::RegisteredKeyFired,
            Self::ClickFired(_) => MsgType::ClickFired,
            Self::UnloadComplete => MsgType::UnloadComplete,
        }
    }

    fn to_payload(&self) -> Result<Option<Value>> {
        match self {
            Self::ClientStarted | Self::UnloadComplete => Ok(None),
            Self::Publish(inner) => encode_payload(inner),
            Self::NavRequest(inner) => encode_payload(inner),
            Self::NotifyRequest(inner) => encode_payload(inner),
            Self::ModalRequest(inner) => encode_payload(inner),
            Self::PageMetadata(inner) => encode_payload(inner),
            Self::PromptOnLeave(inner) => encode_payload(inner),
            Self::RegisteredKeyFired(inner) => encode_payload(inner),
            Self::ClickFired(inner) => encode_payload(inner),
        }
    }

    fn from_payload(msg_type: MsgType, msg: Value) -> Result<Self> {
        let message = match msg_type {
            MsgType::ClientStarted => Self::ClientStarted,
            MsgType::UnloadComplete => Self::UnloadComplete,
            MsgType::Publish => Self::Publish(decode_payload(msg_type, msg)?),
            MsgType::NavRequest => Self::NavRequest(decode_payload(msg_type, msg)?),
            MsgType::NotifyRequest => Self::NotifyRequest(decode_payload(msg_type, msg)?),
            MsgType::ModalRequest => Self::ModalRequest(decode_payload(msg_type, msg)?),
            MsgType::PageMetadata => Self::PageMetadata(decode_payload(msg_type, msg)?),
            MsgType::PromptOnLeave => Self::PromptOnLeave(decode_payload(msg_type, msg)?),
            MsgType::RegisteredKeyFired => {
                Self::RegisteredKeyFired(decode_payload(msg_type, msg)?)
            },
            // Older clients send clickFired without a payload.
            MsgType::ClickFired => Self::ClickFired(
                decode_payload::<Option<input::ClickData>>(msg_type, msg)?.unwrap_or_default(),
            ),
            MsgType::EnvInit | MsgType::UnloadRequest => {
                return Err(ProtocolError::UnknownMessageType(msg_type.as_str().to_string()));
            },
        };
        Ok(message)
    }
}

impl Message for HostToClient {
    const DIRECTION: Direction = Direction::HostToClient;

    fn msg_type(&self) -> MsgType {
        match self {
            Self::Publish(_) => MsgType::Publish,
            Self::EnvInit(_) => MsgType::EnvInit,
            Self::UnloadRequest => MsgType::UnloadRequest,
        }
    }

    fn to_payload(&self) -> Result<Option<Value>> {
        match self {
            Self::Publish(inner) => encode_payload(inner),
            Self::EnvInit(inner) => encode_payload(inner),
            Self::UnloadRequest => Ok(None),
        }
    }

    fn from_payload(msg_type: MsgType, msg: Value) -> Result<Self> {
        match msg_type {
            MsgType::Publish => Ok(Self::Publish(decode_payload(msg_type, msg)?)),
            MsgType::EnvInit => Ok(Self::EnvInit(decode_payload(msg_type, msg)?)),
            MsgType::UnloadRequest => Ok(Self::UnloadRequest),
            MsgType::ClientStarted
            | MsgType::NavRequest
            | MsgType::NotifyRequest
            | MsgType::ModalRequest
            | MsgType::PageMetadata
            | MsgType::PromptOnLeave
            | MsgType::RegisteredKeyFired
            | MsgType::ClickFired
            | MsgType::UnloadComplete => {
                Err(ProtocolError::UnknownMessageType(msg_type.as_str().to_string()))
            },
        }
    }
}

fn encode_payload<T: Serialize>(inner: &T) -> Result<Option<Value>> {
    serde_json::to_value(inner).map(Some).map_err(|e| ProtocolError::Encode(e.to_string()))
}

fn decode_payload<T: DeserializeOwned>(msg_type: MsgType, msg: Value) -> Result<T> {
    serde_json::from_value(msg).map_err(|e| ProtocolError::InvalidPayload {
        msg_type: msg_type.as_str(),
        reason: e.to_string(),
    })
}

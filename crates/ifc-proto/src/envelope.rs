//! Envelope encoding and validation.
//!
//! # Security
//!
//! - Foreign Traffic: `postMessage` is shared with every other script on the
//!   page. Data without our protocol tag that fails validation, or with a
//!   different tag, is classified as [`Inbound::Foreign`] and never produces
//!   an error.
//! - Version Skew: Data carrying our tag that fails validation is an error.
//!   The peer speaks our protocol but a different revision of it, and the
//!   embedding application must hear about that.
//! - Loop Prevention: The `direction` field is checked before the `msgType`
//!   so a participant that is both host and client (nested frames) never
//!   mistakes a message addressed to the other role for a malformed one.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    MsgType,
    errors::{ProtocolError, Result},
    payloads::Message,
};

/// Protocol tag stamped on every envelope.
pub const PROTOCOL: &str = "iframe-coordinator";

/// Version of this library, stamped on every outgoing envelope.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version recorded for envelopes from senders that predate the field.
pub const LEGACY_VERSION: &str = "unknown";

/// Which role a message is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Sent by a client, read by its host.
    ClientToHost,
    /// Sent by a host, read by its client.
    HostToClient,
}

impl Direction {
    /// The other direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::ClientToHost => Self::HostToClient,
            Self::HostToClient => Self::ClientToHost,
        }
    }
}

/// A validated message with its protocol metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<M> {
    /// Protocol tag. Always [`PROTOCOL`] once validated.
    pub protocol: String,
    /// Producer's library version (informational).
    pub version: String,
    /// Role the message is addressed to.
    pub direction: Direction,
    /// Typed message.
    pub message: M,
}

/// Classification of untrusted incoming data.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound<M> {
    /// Valid message for this role.
    Accepted(Envelope<M>),
    /// Not our traffic (other protocol tag, or untagged and unparsable).
    Foreign,
    /// Our traffic, but addressed to the other role.
    Misdirected,
}

impl<M> Inbound<M> {
    /// Accepted envelope, if any.
    pub fn accepted(self) -> Option<Envelope<M>> {
        match self {
            Self::Accepted(envelope) => Some(envelope),
            Self::Foreign | Self::Misdirected => None,
        }
    }
}

impl<M: Message> Envelope<M> {
    /// Wrap a message with this library's protocol metadata.
    pub fn new(message: M) -> Self {
        Self {
            protocol: PROTOCOL.to_string(),
            version: VERSION.to_string(),
            direction: M::DIRECTION,
            message,
        }
    }

    /// Wire tag of the wrapped message.
    pub fn msg_type(&self) -> MsgType {
        self.message.msg_type()
    }

    /// Encode to the wire value handed to `postMessage`.
    ///
    /// Protocol metadata is written unconditionally, even though decoders
    /// treat it as optional.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Encode` if a payload fails to serialize
    pub fn encode(&self) -> Result<Value> {
        let mut wire = Map::new();
        wire.insert("protocol".into(), Value::String(self.protocol.clone()));
        wire.insert("version".into(), Value::String(self.version.clone()));
        wire.insert(
            "direction".into(),
            serde_json::to_value(self.direction).map_err(|e| ProtocolError::Encode(e.to_string()))?,
        );
        wire.insert("msgType".into(), Value::String(self.msg_type().as_str().to_string()));
        if let Some(payload) = self.message.to_payload()? {
            wire.insert("msg".into(), payload);
        }
        Ok(Value::Object(wire))
    }

    /// Classify and decode untrusted data.
    ///
    /// # Errors
    ///
    /// Only data tagged with [`PROTOCOL`] can fail:
    ///
    /// - `ProtocolError::InvalidDirection` if `direction` is not a direction
    /// - `ProtocolError::MissingMessageType` if `msgType` is absent
    /// - `ProtocolError::UnknownMessageType` if `msgType` is not known for
    ///   this role
    /// - `ProtocolError::InvalidPayload` if `msg` does not match the schema
    pub fn decode(raw: &Value) -> Result<Inbound<M>> {
        let Some(wire) = raw.as_object() else {
            return Ok(Inbound::Foreign);
        };

        let tagged = match wire.get("protocol") {
            None | Some(Value::Null) => false,
            Some(Value::String(protocol)) if protocol == PROTOCOL => true,
            Some(_) => return Ok(Inbound::Foreign),
        };

        match Self::decode_fields(wire) {
            Ok(inbound) => Ok(inbound),
            Err(e) if tagged => Err(e),
            Err(_) => Ok(Inbound::Foreign),
        }
    }

    fn decode_fields(wire: &Map<String, Value>) -> Result<Inbound<M>> {
        let direction = match wire.get("direction") {
            None | Some(Value::Null) => M::DIRECTION,
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|_| ProtocolError::InvalidDirection(value.to_string()))?,
        };
        if direction != M::DIRECTION {
            return Ok(Inbound::Misdirected);
        }

        let msg_type = wire
            .get("msgType")
            .and_then(Value::as_str)
            .ok_or(ProtocolError::MissingMessageType)?;
        let msg_type = MsgType::from_wire(msg_type)
            .ok_or_else(|| ProtocolError::UnknownMessageType(msg_type.to_string()))?;
        let msg = wire.get("msg").cloned().unwrap_or(Value::Null);
        let message = M::from_payload(msg_type, msg)?;

        let version = wire.get("version").and_then(Value::as_str).unwrap_or(LEGACY_VERSION);

        Ok(Inbound::Accepted(Self {
            protocol: PROTOCOL.to_string(),
            version: version.to_string(),
            direction,
            message,
        }))
    }
}

/// Decorate and validate a partial `{msgType, msg}` value built by local code.
///
/// Returns the full envelope ready for [`Envelope::encode`].
///
/// # Errors
///
/// - `ProtocolError::InvalidOutgoing` wrapping the validation failure. This is
///   a programming error in the caller and must not be swallowed.
pub fn validate_outgoing<M: Message>(partial: &Value) -> Result<Envelope<M>> {
    let msg_type = partial.get("msgType").and_then(Value::as_str).unwrap_or_default().to_string();

    let mut wire = partial.as_object().cloned().unwrap_or_default();
    wire.insert("protocol".into(), Value::String(PROTOCOL.to_string()));
    wire.insert("version".into(), Value::String(VERSION.to_string()));
    wire.insert(
        "direction".into(),
        serde_json::to_value(M::DIRECTION).map_err(|e| ProtocolError::Encode(e.to_string()))?,
    );

    let reject = |source| ProtocolError::InvalidOutgoing { msg_type: msg_type.clone(), source };
    match Envelope::<M>::decode_fields(&wire) {
        Ok(Inbound::Accepted(envelope)) => Ok(envelope),
        Ok(Inbound::Foreign | Inbound::Misdirected) => {
            Err(reject(Box::new(ProtocolError::InvalidDirection(format!("{:?}", M::DIRECTION)))))
        },
        Err(e) => Err(reject(Box::new(e))),
    }
}

/// Classify and decode untrusted incoming data. See [`Envelope::decode`].
///
/// # Errors
///
/// See [`Envelope::decode`].
pub fn validate_incoming<M: Message>(raw: &Value) -> Result<Inbound<M>> {
    Envelope::decode(raw)
}

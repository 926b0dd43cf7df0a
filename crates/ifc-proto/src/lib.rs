//! Protocol
//!
//! Wire types for the iframe-coordinator message bus: the [`Envelope`] that
//! wraps every message, the [`MsgType`] tag table, and the payload schemas for
//! both directions ([`ClientToHost`], [`HostToClient`]).
//!
//! # Wire format
//!
//! Messages travel as structured-clone compatible JSON values:
//!
//! ```text
//! {
//!   "protocol":  "iframe-coordinator",
//!   "version":   "<producer version>",
//!   "direction": "ClientToHost" | "HostToClient",
//!   "msgType":   "<tag>",
//!   "msg":       <payload selected by msgType>
//! }
//! ```
//!
//! Field names and `msgType` strings are the compatibility surface between
//! independently released hosts and clients. They must never change.
//!
//! # Validation
//!
//! - [`validate_outgoing`] decorates a partial `{msgType, msg}` value with the
//!   protocol metadata and re-validates it. Failures are caller bugs.
//! - [`validate_incoming`] classifies untrusted data as accepted, foreign
//!   (someone else's `postMessage` traffic) or misdirected (addressed to the
//!   other role). Tagged data that fails validation is a [`ProtocolError`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod envelope;
pub mod errors;
mod msg_type;
pub mod payloads;

pub use envelope::{
    Direction, Envelope, Inbound, LEGACY_VERSION, PROTOCOL, VERSION, validate_incoming,
    validate_outgoing,
};
pub use errors::{ProtocolError, Result};
pub use msg_type::MsgType;
pub use payloads::{ClientToHost, HostToClient, Message};

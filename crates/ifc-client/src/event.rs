//! Client events and actions.

use ifc_proto::payloads::{
    input::{ClickData, KeyData},
    lifecycle::EnvInit,
    pubsub::Publication,
};
use serde_json::Value;

/// A message delivered to the client's global scope.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    /// Structured-clone payload.
    pub data: Value,
    /// Serialized origin of the sender. Empty for worker messages.
    pub origin: String,
    /// Whether the sender is the parent window. Always `true` for workers.
    pub from_parent: bool,
}

/// Platform events the caller feeds into the client.
///
/// Application intents (publish, navigation requests and so on) are methods
/// on [`crate::Client`] instead.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// Start the client: listen for messages and announce to the host.
    Start,

    /// Stop the client and release its listeners.
    Stop,

    /// A `message` event was received.
    MessageReceived(InboundMessage),

    /// A `keydown` event fired in the client document.
    KeyDown(KeyData),

    /// A `click` event fired in the client document.
    Click(ClickData),
}

/// Actions the client produces for the caller to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientAction {
    /// Post an encoded envelope to the host.
    PostMessage {
        /// Encoded envelope.
        message: Value,
        /// Target origin for frame clients (`*` when the host origin is not
        /// configured). `None` for worker clients.
        target_origin: Option<String>,
    },

    /// Add the `message` listener.
    AddMessageListener,

    /// Remove the `message` listener.
    RemoveMessageListener,

    /// Add the document `keydown` and `click` listeners (frame clients).
    AddInputListeners,

    /// Remove the document `keydown` and `click` listeners.
    RemoveInputListeners,

    /// Environment data arrived (or was replaced).
    EnvironmentChanged(EnvInit),

    /// Deliver a host publication on a subscribed topic.
    Deliver(Publication),

    /// The host asked this worker to unload. The application should clean up
    /// and call [`crate::Client::acknowledge_unload`].
    UnloadRequested,
}

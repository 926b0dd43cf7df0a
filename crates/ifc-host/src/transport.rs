//! Transport abstraction shared by frame and worker clients.
//!
//! A transport owns one client context (an iframe or a dedicated worker) and
//! knows how to address it: where outgoing messages go, which origin they are
//! restricted to, and which inbound events are trustworthy. The lifecycle and
//! pub/sub logic in [`crate::HostCoordinator`] is written once against this
//! trait.
//!
//! Transports are Sans-IO: sending a message queues a platform action that
//! the driver executes after draining [`ClientTransport::take_actions`].

use ifc_core::Origin;
use ifc_proto::{ClientToHost, Envelope, HostToClient};

use crate::HostError;

/// One client context as seen from the host.
pub trait ClientTransport {
    /// Raw inbound event delivered by the platform.
    type Inbound;

    /// Side effect for the platform driver.
    type Action;

    /// Queue a message for the client.
    ///
    /// Returns `false` when the client is not addressable yet (no trusted
    /// origin, no content window, or no live worker). That is not an error:
    /// the message is dropped and the client receives current state when it
    /// next starts.
    ///
    /// # Errors
    ///
    /// - `HostError::Protocol` if the message cannot be encoded
    fn send_to_client(&mut self, message: HostToClient) -> Result<bool, HostError>;

    /// Origin messages to and from the client must carry, derived from the
    /// client's current location. `None` while undeterminable.
    fn expected_origin(&self) -> Option<Origin>;

    /// Filter and decode an inbound event.
    ///
    /// Returns `Ok(None)` for traffic that is not from this client or not
    /// ours. Transport-level messages (click forwarding, unload
    /// acknowledgement) are handled here and still returned so the
    /// coordinator can report them.
    ///
    /// # Errors
    ///
    /// - `HostError::Protocol` if trusted data tagged with our protocol fails
    ///   validation
    fn receive(&mut self, inbound: Self::Inbound) -> Result<Option<Envelope<ClientToHost>>, HostError>;

    /// Drain queued platform actions.
    fn take_actions(&mut self) -> Vec<Self::Action>;
}

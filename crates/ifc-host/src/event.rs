//! Host-facing events.
//!
//! These are what the embedding application observes. In a browser they are
//! dispatched as DOM events on the host element; [`HostEvent::name`] gives
//! the event name used there.

use ifc_core::ClientId;
use ifc_proto::{ClientToHost, Message, payloads::pubsub::Publication};

/// Events produced by host components, drained with `take_events`.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// The client owning the current route changed.
    ClientChanged {
        /// Client shown before the change.
        previous: Option<ClientId>,
        /// Client shown now. `None` when no client owns the route.
        current: Option<ClientId>,
    },

    /// No registration owns the requested route.
    ClientNotFound {
        /// Route as requested.
        route: String,
    },

    /// The frame was pointed at a new location.
    FrameTransition {
        /// Location the frame navigates to.
        location: String,
    },

    /// A client completed the first half of the handshake.
    ClientStarted {
        /// Client that started, if known.
        client_id: Option<ClientId>,
    },

    /// A client published on a topic the host is subscribed to.
    Publication {
        /// Publication annotated with the sending client.
        publication: Publication,
    },

    /// A client asked the host to do something (navigate, notify, open a
    /// modal, update page metadata, prompt on leave, or a registered key).
    Request {
        /// Client that sent the request, if known.
        client_id: Option<ClientId>,
        /// The request as received.
        message: ClientToHost,
    },

    /// A worker client finished unloading.
    WorkerUnloaded {
        /// Worker client that was unloaded.
        client_id: ClientId,
        /// `true` when the unload timeout expired before the worker
        /// acknowledged.
        forced: bool,
    },
}

impl HostEvent {
    /// DOM event name for this event.
    ///
    /// Requests use their wire tag, so hosts can listen for `navRequest`,
    /// `notifyRequest` and friends directly.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ClientChanged { .. } => "clientChanged",
            Self::ClientNotFound { .. } => "clientNotFound",
            Self::FrameTransition { .. } => "frameTransition",
            Self::ClientStarted { .. } => "clientStarted",
            Self::Publication { .. } => "publish",
            Self::Request { message, .. } => message.msg_type().as_str(),
            Self::WorkerUnloaded { .. } => "workerUnloaded",
        }
    }
}

#[cfg(test)]
mod tests {
    use ifc_proto::payloads::requests::NavRequest;

    use super::*;

    #[test]
    fn requests_are_named_by_wire_tag() {
        let event = HostEvent::Request {
            client_id: Some("app1".into()),
            message: ClientToHost::NavRequest(NavRequest { url: "/x".into(), history: None }),
        };
        assert_eq!(event.name(), "navRequest");
        assert_eq!(HostEvent::ClientNotFound { route: "x".into() }.name(), "clientNotFound");
    }
}

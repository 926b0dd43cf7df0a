//! Lifecycle and pub/sub coordination for one client.
//!
//! [`HostCoordinator`] sits on top of a [`ClientTransport`] and implements
//! the host half of the protocol:
//!
//! - Handshake: `client_started` is answered with `env_init` carrying the
//!   shared environment and the client's assigned route. A client that
//!   reloads starts again and is answered again.
//! - Pub/sub: publications are forwarded to the host only for topics it
//!   subscribed to, annotated with the sending client's id.
//! - Requests: everything else a client sends is surfaced as a
//!   [`HostEvent::Request`].
//!
//! The coordinator is the single place that knows which client is bound to
//! the transport; route resolution rebinds it through
//! [`HostCoordinator::bind_client`].

use std::collections::BTreeSet;

use ifc_core::{ClientId, EnvironmentData};
use ifc_proto::{ClientToHost, HostToClient, Message, payloads::pubsub::Publication, validate_outgoing};
use serde_json::Value;

use crate::{ClientTransport, HostError, HostEvent};

/// Client currently addressed by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientBinding {
    /// Registration key.
    pub id: ClientId,
    /// Normalized route prefix the client owns.
    pub assigned_route: String,
}

impl ClientBinding {
    /// Binding for `id` owning `assigned_route`.
    pub fn new(id: impl Into<ClientId>, assigned_route: impl Into<String>) -> Self {
        Self { id: id.into(), assigned_route: assigned_route.into() }
    }
}

/// Host side of the protocol for one client transport.
#[derive(Debug, Clone)]
pub struct HostCoordinator<T> {
    transport: T,
    environment: EnvironmentData,
    client: Option<ClientBinding>,
    subscriptions: BTreeSet<String>,
    events: Vec<HostEvent>,
}

impl<T: ClientTransport> HostCoordinator<T> {
    /// Coordinator over `transport` sharing `environment` with its client.
    pub fn new(transport: T, environment: EnvironmentData) -> Self {
        Self {
            transport,
            environment,
            client: None,
            subscriptions: BTreeSet::new(),
            events: Vec::new(),
        }
    }

    /// Underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Underlying transport, mutably.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Shared environment.
    pub fn environment(&self) -> &EnvironmentData {
        &self.environment
    }

    /// Replace the shared environment. Takes effect on the next handshake.
    pub fn set_environment(&mut self, environment: EnvironmentData) {
        self.environment = environment;
    }

    /// Client the transport currently addresses.
    pub fn client(&self) -> Option<&ClientBinding> {
        self.client.as_ref()
    }

    /// Rebind the transport to another client (or none).
    pub fn bind_client(&mut self, client: Option<ClientBinding>) {
        self.client = client;
    }

    /// Forward publications on `topic` to the host. Idempotent.
    pub fn subscribe(&mut self, topic: impl Into<String>) {
        self.subscriptions.insert(topic.into());
    }

    /// Stop forwarding publications on `topic`. Idempotent.
    pub fn unsubscribe(&mut self, topic: &str) {
        self.subscriptions.remove(topic);
    }

    /// Whether the host is subscribed to `topic`.
    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.subscriptions.contains(topic)
    }

    /// Publish to the client. Returns whether the message was handed to the
    /// platform.
    ///
    /// # Errors
    ///
    /// - `HostError::Protocol` if the payload cannot be encoded
    pub fn publish(&mut self, topic: impl Into<String>, payload: Value) -> Result<bool, HostError> {
        self.transport.send_to_client(HostToClient::Publish(Publication::new(topic, payload)))
    }

    /// Validate and send a partial `{msgType, msg}` message built by host
    /// code.
    ///
    /// # Errors
    ///
    /// - `HostError::Protocol` wrapping `ProtocolError::InvalidOutgoing` if
    ///   the message is not a valid host-to-client message
    pub fn send_partial(&mut self, partial: &Value) -> Result<bool, HostError> {
        let envelope = validate_outgoing::<HostToClient>(partial)?;
        self.transport.send_to_client(envelope.message)
    }

    /// Handle one raw inbound event from the platform.
    ///
    /// # Errors
    ///
    /// - `HostError::Protocol` if a trusted message fails validation
    pub fn handle_inbound(&mut self, inbound: T::Inbound) -> Result<(), HostError> {
        let Some(envelope) = self.transport.receive(inbound)? else {
            return Ok(());
        };
        self.dispatch(envelope.message)
    }

    fn dispatch(&mut self, message: ClientToHost) -> Result<(), HostError> {
        let client_id = self.client.as_ref().map(|c| c.id.clone());

        match message {
            ClientToHost::ClientStarted => {
                tracing::info!(client_id = ?client_id, "client started");
                self.send_env_init()?;
                self.events.push(HostEvent::ClientStarted { client_id });
            },
            ClientToHost::Publish(publication) => {
                if !self.is_subscribed(&publication.topic) {
                    tracing::trace!(topic = %publication.topic, "no host subscription; dropped");
                    return Ok(());
                }
                let publication = match client_id {
                    Some(id) => publication.with_client_id(id),
                    None => publication,
                };
                self.events.push(HostEvent::Publication { publication });
            },
            ClientToHost::UnloadComplete => {
                if let Some(client_id) = client_id {
                    self.events.push(HostEvent::WorkerUnloaded { client_id, forced: false });
                }
            },
            // The transport already forwarded the click to the platform.
            ClientToHost::ClickFired(_) => {},
            message @ (ClientToHost::NavRequest(_)
            | ClientToHost::NotifyRequest(_)
            | ClientToHost::ModalRequest(_)
            | ClientToHost::PageMetadata(_)
            | ClientToHost::PromptOnLeave(_)
            | ClientToHost::RegisteredKeyFired(_)) => {
                tracing::debug!(client_id = ?client_id, msg_type = %message.msg_type(), "client request");
                self.events.push(HostEvent::Request { client_id, message });
            },
        }

        Ok(())
    }

    fn send_env_init(&mut self) -> Result<(), HostError> {
        let Some(client) = &self.client else {
            tracing::warn!("client started without a binding; env_init not sent");
            return Ok(());
        };
        let init = self.environment.env_init(&client.assigned_route);
        self.transport.send_to_client(HostToClient::EnvInit(init))?;
        Ok(())
    }

    /// Record a host event produced outside message handling.
    pub(crate) fn push_event(&mut self, event: HostEvent) {
        self.events.push(event);
    }

    /// Drain pending host events.
    pub fn take_events(&mut self) -> Vec<HostEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drain pending platform actions.
    pub fn take_actions(&mut self) -> Vec<T::Action> {
        self.transport.take_actions()
    }
}

#[cfg(test)]
mod tests {
    use ifc_proto::{
        Envelope, Inbound, ProtocolError, validate_incoming,
        payloads::requests::{NavRequest, PromptOnLeave},
    };
    use serde_json::json;

    use super::*;
    use crate::{FrameAction, FrameManager, MessageEvent, WindowId};

    const CLIENT: &str = "https://client.example";

    fn coordinator() -> HostCoordinator<FrameManager> {
        let mut frame = FrameManager::new(None);
        frame.handle_load(WindowId(1));
        frame.set_frame_location(Some("https://client.example/#/"));
        frame.start_message_handler();
        frame.take_actions();

        let environment = EnvironmentData {
            locale: "en-US".into(),
            host_root_url: "https://host.example/#/".into(),
            registered_keys: None,
            custom: None,
        };
        let mut coordinator = HostCoordinator::new(frame, environment);
        coordinator.bind_client(Some(ClientBinding::new("app1", "app1")));
        coordinator
    }

    fn from_client(message: ClientToHost) -> MessageEvent {
        MessageEvent {
            data: Envelope::new(message).encode().unwrap(),
            origin: CLIENT.into(),
            source: Some(WindowId(1)),
        }
    }

    fn posted(actions: Vec<FrameAction>) -> Vec<HostToClient> {
        actions
            .into_iter()
            .filter_map(|action| match action {
                FrameAction::PostMessage { message, .. } => {
                    validate_incoming::<HostToClient>(&message).ok().and_then(Inbound::accepted)
                },
                _ => None,
            })
            .map(|envelope| envelope.message)
            .collect()
    }

    #[test]
    fn client_started_is_answered_with_env_init() {
        let mut coordinator = coordinator();
        coordinator.handle_inbound(from_client(ClientToHost::ClientStarted)).unwrap();

        let sent = posted(coordinator.take_actions());
        let [HostToClient::EnvInit(init)] = sent.as_slice() else {
            unreachable!("expected env_init, got {sent:?}");
        };
        assert_eq!(init.assigned_route, "app1");
        assert_eq!(init.locale, "en-US");
        assert_eq!(
            coordinator.take_events(),
            vec![HostEvent::ClientStarted { client_id: Some("app1".into()) }]
        );
    }

    #[test]
    fn restarted_client_gets_env_init_again() {
        let mut coordinator = coordinator();
        coordinator.handle_inbound(from_client(ClientToHost::ClientStarted)).unwrap();
        coordinator.handle_inbound(from_client(ClientToHost::ClientStarted)).unwrap();
        assert_eq!(posted(coordinator.take_actions()).len(), 2);
    }

    #[test]
    fn publications_require_subscription() {
        let mut coordinator = coordinator();
        let publish = || ClientToHost::Publish(Publication::new("t", json!("p")));

        coordinator.handle_inbound(from_client(publish())).unwrap();
        assert!(coordinator.take_events().is_empty());

        coordinator.subscribe("t");
        coordinator.handle_inbound(from_client(publish())).unwrap();
        assert_eq!(
            coordinator.take_events(),
            vec![HostEvent::Publication {
                publication: Publication::new("t", json!("p")).with_client_id("app1")
            }]
        );

        coordinator.unsubscribe("t");
        coordinator.handle_inbound(from_client(publish())).unwrap();
        assert!(coordinator.take_events().is_empty());
    }

    #[test]
    fn requests_are_surfaced() {
        let mut coordinator = coordinator();
        let nav = ClientToHost::NavRequest(NavRequest { url: "/other".into(), history: None });
        let prompt =
            ClientToHost::PromptOnLeave(PromptOnLeave { should_prompt: true, message: None });
        coordinator.handle_inbound(from_client(nav.clone())).unwrap();
        coordinator.handle_inbound(from_client(prompt.clone())).unwrap();

        assert_eq!(
            coordinator.take_events(),
            vec![
                HostEvent::Request { client_id: Some("app1".into()), message: nav },
                HostEvent::Request { client_id: Some("app1".into()), message: prompt },
            ]
        );
    }

    #[test]
    fn host_publish_reaches_client() {
        let mut coordinator = coordinator();
        assert_eq!(coordinator.publish("t", json!({"a": 1})), Ok(true));
        assert_eq!(
            posted(coordinator.take_actions()),
            vec![HostToClient::Publish(Publication::new("t", json!({"a": 1})))]
        );
    }

    #[test]
    fn invalid_partial_is_rejected_loudly() {
        let mut coordinator = coordinator();
        let err = coordinator.send_partial(&json!({"msgType": "navRequest", "msg": {}})).unwrap_err();
        assert!(matches!(err, HostError::Protocol(ProtocolError::InvalidOutgoing { .. })));
        assert!(coordinator.take_actions().is_empty());

        let sent = coordinator.send_partial(&json!({"msgType": "publish", "msg": {"topic": "t", "payload": 1}}));
        assert_eq!(sent, Ok(true));
    }
}

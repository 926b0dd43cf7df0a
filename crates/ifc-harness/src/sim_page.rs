//! Simulated host page.
//!
//! One host window embedding a [`FrameRouter`]. Client applications are
//! "deployed" at origins; whenever the frame navigates to a location on such
//! an origin, a fresh [`Client`] is started in the new document, just like a
//! page load would run the client's script.

use std::collections::BTreeMap;

use ifc_client::{Client, ClientAction, ClientConfig, ClientError, ClientEvent, InboundMessage};
use ifc_core::{Lifecycle, Origin};
use ifc_host::{
    FrameAction, FrameRouter, FrameRouterConfig, HostError, HostEvent, MessageEvent, ROUTE_ATTRIBUTE,
    WindowId,
};
use serde_json::Value;

use crate::{Delivery, Endpoint, Trace, TraceEntry};

/// Content window of the host's frame. Navigation replaces the document, not
/// the window.
const FRAME_WINDOW: WindowId = WindowId(1);

const ANY_ORIGIN: &str = "*";

/// A client application served from one origin.
#[derive(Debug, Clone, Default)]
pub struct ClientApp {
    /// Client configuration used on every load.
    pub config: ClientConfig,
    /// Topics the application subscribes to right after starting.
    pub topics: Vec<String>,
}

impl ClientApp {
    /// Application with `config` and no subscriptions.
    pub fn new(config: ClientConfig) -> Self {
        Self { config, topics: Vec::new() }
    }

    /// Subscribe to `topic` on start.
    #[must_use]
    pub fn subscribed(mut self, topic: impl Into<String>) -> Self {
        self.topics.push(topic.into());
        self
    }
}

/// A document loaded into the frame.
#[derive(Debug)]
pub struct SimDocument {
    /// Document number, unique per page.
    pub id: u64,
    /// Location the document was loaded from.
    pub location: String,
    /// Document origin. `None` for opaque origins such as `about:blank`.
    pub origin: Option<String>,
    /// Running client, if an application is deployed at the origin.
    pub client: Option<Client>,
    /// Environment updates, deliveries and unload requests the application
    /// saw, in order.
    pub received: Vec<ClientAction>,
}

/// Host page with a route-following frame.
#[derive(Debug)]
pub struct SimPage {
    host: FrameRouter,
    host_origin: String,
    host_listening: bool,
    apps: BTreeMap<String, ClientApp>,
    document: Option<SimDocument>,
    next_document: u64,
    attributes: BTreeMap<&'static str, Option<String>>,
    clicks: usize,
    events: Vec<HostEvent>,
    host_errors: Vec<HostError>,
    client_errors: Vec<ClientError>,
    trace: Trace,
}

impl SimPage {
    /// Page served from `host_origin`, with its host element attached and
    /// the frame's initial `about:blank` load completed.
    ///
    /// # Errors
    ///
    /// - `HostError::Router` if a client URL is invalid
    pub fn new(config: FrameRouterConfig, host_origin: impl Into<String>) -> Result<Self, HostError> {
        let mut page = Self {
            host: FrameRouter::new(config)?,
            host_origin: host_origin.into(),
            host_listening: false,
            apps: BTreeMap::new(),
            document: None,
            next_document: 0,
            attributes: BTreeMap::new(),
            clicks: 0,
            events: Vec::new(),
            host_errors: Vec::new(),
            client_errors: Vec::new(),
            trace: Trace::new(),
        };
        page.host.on_attach();
        page.host.handle_load(FRAME_WINDOW);
        page.run();
        Ok(page)
    }

    /// Serve `app` from `origin`. Takes effect on the next load.
    pub fn deploy(&mut self, origin: impl Into<String>, app: ClientApp) {
        self.apps.insert(origin.into(), app);
    }

    /// The host element.
    pub fn host(&self) -> &FrameRouter {
        &self.host
    }

    /// Content window of the frame, as seen in `MessageEvent::source`.
    pub fn frame_window(&self) -> WindowId {
        FRAME_WINDOW
    }

    /// Document currently in the frame.
    pub fn document(&self) -> Option<&SimDocument> {
        self.document.as_ref()
    }

    /// Current frame attribute value by attribute name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(Option::as_deref)
    }

    /// Synthetic clicks dispatched on the frame element.
    pub fn clicks(&self) -> usize {
        self.clicks
    }

    /// Recorded messages and navigations.
    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    /// Mutable trace, to clear it between phases of a test.
    pub fn trace_mut(&mut self) -> &mut Trace {
        &mut self.trace
    }

    /// Drain host events.
    pub fn take_events(&mut self) -> Vec<HostEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drain errors raised by the host.
    pub fn take_host_errors(&mut self) -> Vec<HostError> {
        std::mem::take(&mut self.host_errors)
    }

    /// Drain errors raised by client documents.
    pub fn take_client_errors(&mut self) -> Vec<ClientError> {
        std::mem::take(&mut self.client_errors)
    }

    /// Set the host element's `route` attribute.
    pub fn set_route(&mut self, route: &str) {
        self.host.on_attribute_change(ROUTE_ATTRIBUTE, Some(route));
        self.run();
    }

    /// Remove the host element from the document.
    pub fn detach(&mut self) {
        self.host.on_detach();
        self.run();
    }

    /// Host subscribes to client publications on `topic`.
    pub fn host_subscribe(&mut self, topic: &str) {
        self.host.subscribe(topic);
    }

    /// Host publishes to the current client. Returns whether a message was
    /// posted.
    ///
    /// # Errors
    ///
    /// - `HostError::Protocol` if the payload cannot be encoded
    pub fn host_publish(&mut self, topic: &str, payload: Value) -> Result<bool, HostError> {
        let posted = self.host.publish(topic, payload)?;
        self.run();
        Ok(posted)
    }

    /// Run `call` against the client in the frame and execute the actions it
    /// returns. Does nothing when no client is running.
    ///
    /// # Errors
    ///
    /// - whatever `call` returns
    pub fn with_client<F>(&mut self, call: F) -> Result<(), ClientError>
    where
        F: FnOnce(&mut Client) -> Result<Vec<ClientAction>, ClientError>,
    {
        let Some(client) = self.document.as_mut().and_then(|d| d.client.as_mut()) else {
            return Ok(());
        };
        let actions = call(client)?;
        self.execute_client_actions(actions);
        self.run();
        Ok(())
    }

    /// Deliver a message event to the host window as if posted by a window
    /// outside the bus.
    pub fn inject(&mut self, event: MessageEvent) {
        self.trace.record(TraceEntry::Post(Delivery {
            from: Endpoint::Foreign(event.origin.clone()),
            to: Endpoint::Host,
            msg_type: Delivery::msg_type_of(&event.data),
            target_origin: Some(ANY_ORIGIN.to_string()),
            recipient_origin: Some(self.host_origin.clone()),
            delivered: self.host_listening,
        }));
        if self.host_listening {
            self.deliver_to_host(event);
        }
        self.run();
    }

    /// Execute host actions until the host is idle.
    fn run(&mut self) {
        loop {
            self.events.extend(self.host.take_events());
            let actions = self.host.take_actions();
            if actions.is_empty() {
                break;
            }
            for action in actions {
                self.execute_frame_action(action);
            }
        }
    }

    fn execute_frame_action(&mut self, action: FrameAction) {
        match action {
            FrameAction::Navigate { location } => self.load(location),
            FrameAction::SetAttribute { attribute, value } => {
                self.attributes.insert(attribute.as_str(), value);
            },
            FrameAction::PostMessage { message, target_origin } => {
                self.post_to_frame(message, target_origin);
            },
            FrameAction::AddMessageListener => self.host_listening = true,
            FrameAction::RemoveMessageListener => self.host_listening = false,
            FrameAction::Click => self.clicks += 1,
        }
    }

    /// Replace the frame's document and run the client deployed at its
    /// origin, if any.
    fn load(&mut self, location: String) {
        if let Some(mut previous) = self.document.take() {
            if let Some(client) = previous.client.as_mut() {
                // The old document's listeners die with it.
                let _ = client.handle(ClientEvent::Stop);
            }
        }

        self.next_document += 1;
        let id = self.next_document;
        let origin = Origin::of(&location, None).map(|o| o.to_string());
        self.trace.record(TraceEntry::Navigated { document: id, location: location.clone() });

        let app = origin.as_ref().and_then(|o| self.apps.get(o)).cloned();
        let mut document =
            SimDocument { id, location, origin, client: None, received: Vec::new() };

        let mut actions = Vec::new();
        if let Some(app) = app {
            let mut client = Client::new(app.config);
            for topic in app.topics {
                client.subscribe(topic);
            }
            match client.handle(ClientEvent::Start) {
                Ok(started) => actions = started,
                Err(e) => self.client_errors.push(e),
            }
            document.client = Some(client);
        }
        self.document = Some(document);

        self.execute_client_actions(actions);
        self.host.handle_load(FRAME_WINDOW);
    }

    fn post_to_frame(&mut self, message: Value, target_origin: String) {
        let recipient = self.document.as_ref().map(|d| (d.id, d.origin.clone()));
        let Some((document, recipient_origin)) = recipient else {
            return;
        };

        let origin_ok =
            target_origin == ANY_ORIGIN || recipient_origin.as_deref() == Some(target_origin.as_str());
        let listening = self
            .document
            .as_ref()
            .and_then(|d| d.client.as_ref())
            .is_some_and(Client::is_started);
        let delivered = origin_ok && listening;

        self.trace.record(TraceEntry::Post(Delivery {
            from: Endpoint::Host,
            to: Endpoint::Frame(document),
            msg_type: Delivery::msg_type_of(&message),
            target_origin: Some(target_origin),
            recipient_origin,
            delivered,
        }));
        if !delivered {
            return;
        }

        let inbound = InboundMessage { data: message, origin: self.host_origin.clone(), from_parent: true };
        let Some(client) = self.document.as_mut().and_then(|d| d.client.as_mut()) else {
            return;
        };
        match client.handle(ClientEvent::MessageReceived(inbound)) {
            Ok(actions) => self.execute_client_actions(actions),
            Err(e) => self.client_errors.push(e),
        }
    }

    fn execute_client_actions(&mut self, actions: Vec<ClientAction>) {
        for action in actions {
            match action {
                ClientAction::PostMessage { message, target_origin } => {
                    self.post_to_host(message, target_origin);
                },
                ClientAction::AddMessageListener
                | ClientAction::RemoveMessageListener
                | ClientAction::AddInputListeners
                | ClientAction::RemoveInputListeners => {},
                received @ (ClientAction::EnvironmentChanged(_)
                | ClientAction::Deliver(_)
                | ClientAction::UnloadRequested) => {
                    if let Some(document) = self.document.as_mut() {
                        document.received.push(received);
                    }
                },
            }
        }
    }

    fn post_to_host(&mut self, message: Value, target_origin: Option<String>) {
        let Some(document) = self.document.as_ref() else {
            return;
        };
        let sender_origin = document.origin.clone().unwrap_or_else(|| "null".to_string());
        let origin_ok = target_origin
            .as_deref()
            .is_none_or(|t| t == ANY_ORIGIN || t == self.host_origin);
        let delivered = origin_ok && self.host_listening;

        self.trace.record(TraceEntry::Post(Delivery {
            from: Endpoint::Frame(document.id),
            to: Endpoint::Host,
            msg_type: Delivery::msg_type_of(&message),
            target_origin,
            recipient_origin: Some(self.host_origin.clone()),
            delivered,
        }));
        if delivered {
            self.deliver_to_host(MessageEvent {
                data: message,
                origin: sender_origin,
                source: Some(FRAME_WINDOW),
            });
        }
    }

    fn deliver_to_host(&mut self, event: MessageEvent) {
        if let Err(e) = self.host.handle_message(event) {
            self.host_errors.push(e);
        }
        self.events.extend(self.host.take_events());
    }
}

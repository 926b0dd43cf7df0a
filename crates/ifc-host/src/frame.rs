//! Frame transport.
//!
//! [`FrameManager`] owns one iframe element and the messaging with whatever
//! document is loaded in it. It never performs I/O itself: every effect on
//! the element, its content window or the host window's message listener is
//! queued as a [`FrameAction`].
//!
//! # Security
//!
//! - Outgoing messages are restricted to the origin of the frame's current
//!   location. Unknown origin (`about:blank`, unparsable) means no message is
//!   sent at all, never a wildcard target.
//! - Incoming messages are accepted only when their origin equals that
//!   origin *and* their source is the frame's content window. Both are
//!   checked before the data is looked at.
//! - The sandbox always contains the default tokens; registrations can only
//!   add to them.
//!
//! # Navigation
//!
//! The frame is navigated by replacing its content window's location, so the
//! host's own history is not touched. Until the first `load` reports the
//! content window, the latest requested location is kept and applied on that
//! load; earlier requests are superseded.

use ifc_core::{Origin, Url};
use ifc_proto::{ClientToHost, Envelope, HostToClient, Inbound, validate_incoming};
use serde_json::Value;

use crate::{ClientTransport, HostError};

/// Location used when no client owns the route.
pub const BLANK_LOCATION: &str = "about:blank";

/// Sandbox tokens every client frame gets.
pub const DEFAULT_SANDBOX: [&str; 6] = [
    "allow-scripts",
    "allow-same-origin",
    "allow-modals",
    "allow-forms",
    "allow-popups",
    "allow-popups-to-escape-sandbox",
];

/// Opaque handle of a browsing context (a `WindowProxy`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u64);

/// A `message` event delivered to the host window.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageEvent {
    /// Structured-clone payload.
    pub data: Value,
    /// Serialized origin of the sender.
    pub origin: String,
    /// Window that posted the message. `None` for non-window sources.
    pub source: Option<WindowId>,
}

/// Frame element attributes managed by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameAttribute {
    /// Feature policy (`allow`).
    Allow,
    /// Sandbox tokens (`sandbox`).
    Sandbox,
    /// Accessible title (`title`).
    Title,
}

impl FrameAttribute {
    /// HTML attribute name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Sandbox => "sandbox",
            Self::Title => "title",
        }
    }
}

/// Platform effects requested by a [`FrameManager`].
#[derive(Debug, Clone, PartialEq)]
pub enum FrameAction {
    /// `contentWindow.location.replace(location)`.
    Navigate {
        /// Absolute or host-relative location.
        location: String,
    },

    /// Set (`Some`) or remove (`None`) an attribute on the frame element.
    SetAttribute {
        /// Attribute to change.
        attribute: FrameAttribute,
        /// New value.
        value: Option<String>,
    },

    /// `contentWindow.postMessage(message, target_origin)`.
    PostMessage {
        /// Encoded envelope.
        message: Value,
        /// Exact origin the message is restricted to.
        target_origin: String,
    },

    /// Add the host window `message` listener.
    AddMessageListener,

    /// Remove the host window `message` listener.
    RemoveMessageListener,

    /// Dispatch a synthetic click on the frame element, so host-side
    /// click-outside handlers see clicks made inside the client.
    Click,
}

/// Iframe transport state machine.
#[derive(Debug, Clone)]
pub struct FrameManager {
    host_url: Option<Url>,
    location: String,
    content_window: Option<WindowId>,
    pending_navigation: Option<String>,
    listening: bool,
    actions: Vec<FrameAction>,
}

impl FrameManager {
    /// Manager for a fresh frame showing `about:blank`.
    ///
    /// `host_url` resolves relative client locations. The default sandbox is
    /// applied immediately.
    pub fn new(host_url: Option<Url>) -> Self {
        let mut manager = Self {
            host_url,
            location: BLANK_LOCATION.to_string(),
            content_window: None,
            pending_navigation: None,
            listening: false,
            actions: Vec::new(),
        };
        manager.set_frame_sandbox(None);
        manager
    }

    /// Location the frame shows, or will show once loaded.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Content window reported by the last `load`.
    pub fn content_window(&self) -> Option<WindowId> {
        self.content_window
    }

    /// Whether the host message listener is installed.
    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Point the frame at `location`, or at `about:blank` for `None`.
    ///
    /// Returns the location actually used. Navigation happens immediately
    /// when the content window is known; otherwise it is deferred to the next
    /// [`FrameManager::handle_load`].
    pub fn set_frame_location(&mut self, location: Option<&str>) -> String {
        let location = location.filter(|l| !l.is_empty()).unwrap_or(BLANK_LOCATION).to_string();
        self.location.clone_from(&location);

        if self.content_window.is_some() {
            self.pending_navigation = None;
            self.actions.push(FrameAction::Navigate { location: location.clone() });
        } else {
            tracing::trace!(%location, "frame not loaded; deferring navigation");
            self.pending_navigation = Some(location.clone());
        }

        location
    }

    /// The frame fired `load`; `window` is its content window.
    pub fn handle_load(&mut self, window: WindowId) {
        self.content_window = Some(window);
        if let Some(location) = self.pending_navigation.take() {
            tracing::debug!(%location, "applying deferred navigation");
            self.actions.push(FrameAction::Navigate { location });
        }
    }

    /// Set the frame's feature policy. `None` removes it.
    pub fn set_frame_allow(&mut self, allow: Option<&str>) {
        self.actions.push(FrameAction::SetAttribute {
            attribute: FrameAttribute::Allow,
            value: allow.map(str::to_string),
        });
    }

    /// Set the frame's sandbox to the defaults plus `extra` tokens.
    ///
    /// Returns the applied token list: defaults first, then unseen extras in
    /// their given order.
    pub fn set_frame_sandbox(&mut self, extra: Option<&str>) -> String {
        let sandbox = merge_sandbox(extra);
        self.actions.push(FrameAction::SetAttribute {
            attribute: FrameAttribute::Sandbox,
            value: Some(sandbox.clone()),
        });
        sandbox
    }

    /// Set the frame's accessible title. `None` removes it.
    pub fn set_frame_default_title(&mut self, title: Option<&str>) {
        self.actions.push(FrameAction::SetAttribute {
            attribute: FrameAttribute::Title,
            value: title.map(str::to_string),
        });
    }

    /// Install the host message listener. Idempotent.
    pub fn start_message_handler(&mut self) {
        if !self.listening {
            self.listening = true;
            self.actions.push(FrameAction::AddMessageListener);
        }
    }

    /// Remove the host message listener. Idempotent.
    pub fn stop_message_handler(&mut self) {
        if self.listening {
            self.listening = false;
            self.actions.push(FrameAction::RemoveMessageListener);
        }
    }

    /// Origin of the current location. See [`Origin::of`].
    pub fn expected_client_origin(&self) -> Option<Origin> {
        Origin::of(&self.location, self.host_url.as_ref())
    }

    /// Classify a `message` event received by the host window.
    ///
    /// # Errors
    ///
    /// - `HostError::Protocol` if a message from the frame is tagged with our
    ///   protocol but fails validation
    pub fn handle_message(
        &mut self,
        event: MessageEvent,
    ) -> Result<Option<Envelope<ClientToHost>>, HostError> {
        if !self.listening {
            return Ok(None);
        }

        let Some(expected) = self.expected_client_origin() else {
            tracing::trace!(origin = %event.origin, "no client origin; ignoring message");
            return Ok(None);
        };
        if !expected.matches(&event.origin) {
            tracing::debug!(origin = %event.origin, %expected, "ignoring message from unexpected origin");
            return Ok(None);
        }
        if event.source.is_none() || event.source != self.content_window {
            tracing::debug!(origin = %event.origin, "ignoring message from another window");
            return Ok(None);
        }

        match validate_incoming::<ClientToHost>(&event.data) {
            Ok(Inbound::Accepted(envelope)) => {
                if matches!(envelope.message, ClientToHost::ClickFired(_)) {
                    self.actions.push(FrameAction::Click);
                }
                Ok(Some(envelope))
            },
            Ok(Inbound::Foreign | Inbound::Misdirected) => Ok(None),
            Err(e) => {
                tracing::warn!(origin = %event.origin, error = %e, "invalid message from client");
                Err(e.into())
            },
        }
    }

    /// Drain queued platform actions.
    pub fn take_actions(&mut self) -> Vec<FrameAction> {
        std::mem::take(&mut self.actions)
    }
}

impl ClientTransport for FrameManager {
    type Inbound = MessageEvent;
    type Action = FrameAction;

    fn send_to_client(&mut self, message: HostToClient) -> Result<bool, HostError> {
        let Some(origin) = self.expected_client_origin() else {
            tracing::debug!(location = %self.location, "client origin unknown; message dropped");
            return Ok(false);
        };
        if self.content_window.is_none() {
            tracing::debug!(%origin, "frame not loaded; message dropped");
            return Ok(false);
        }

        let message = Envelope::new(message).encode()?;
        self.actions.push(FrameAction::PostMessage { message, target_origin: origin.to_string() });
        Ok(true)
    }

    fn expected_origin(&self) -> Option<Origin> {
        self.expected_client_origin()
    }

    fn receive(&mut self, inbound: MessageEvent) -> Result<Option<Envelope<ClientToHost>>, HostError> {
        self.handle_message(inbound)
    }

    fn take_actions(&mut self) -> Vec<FrameAction> {
        FrameManager::take_actions(self)
    }
}

/// Defaults first, then extra tokens not already present.
fn merge_sandbox(extra: Option<&str>) -> String {
    let mut tokens: Vec<&str> = DEFAULT_SANDBOX.to_vec();
    for token in extra.unwrap_or_default().split_whitespace() {
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    tokens.join(" ")
}

#[cfg(test)]
mod tests {
    use ifc_proto::payloads::pubsub::Publication;
    use serde_json::json;

    use super::*;

    const CLIENT: &str = "https://client.example";

    fn loaded_manager() -> FrameManager {
        let mut manager = FrameManager::new(None);
        manager.handle_load(WindowId(1));
        manager.set_frame_location(Some("https://client.example/app/#/"));
        manager.start_message_handler();
        manager.take_actions();
        manager
    }

    fn event(data: Value, origin: &str, source: Option<WindowId>) -> MessageEvent {
        MessageEvent { data, origin: origin.to_string(), source }
    }

    fn started() -> Value {
        Envelope::new(ClientToHost::ClientStarted).encode().unwrap()
    }

    #[test]
    fn new_frame_gets_default_sandbox() {
        let mut manager = FrameManager::new(None);
        assert_eq!(
            manager.take_actions(),
            vec![FrameAction::SetAttribute {
                attribute: FrameAttribute::Sandbox,
                value: Some(DEFAULT_SANDBOX.join(" ")),
            }]
        );
        assert_eq!(manager.location(), BLANK_LOCATION);
    }

    #[test]
    fn sandbox_extras_are_appended_once() {
        let merged = merge_sandbox(Some("allow-presentation allow-scripts allow-presentation"));
        assert_eq!(merged, format!("{} allow-presentation", DEFAULT_SANDBOX.join(" ")));
        assert_eq!(merge_sandbox(Some("   ")), DEFAULT_SANDBOX.join(" "));
    }

    #[test]
    fn navigation_before_load_is_deferred_last_write_wins() {
        let mut manager = FrameManager::new(None);
        manager.take_actions();

        assert_eq!(manager.set_frame_location(Some("https://a.example/")), "https://a.example/");
        manager.set_frame_location(Some("https://b.example/"));
        assert!(manager.take_actions().is_empty());

        manager.handle_load(WindowId(7));
        assert_eq!(
            manager.take_actions(),
            vec![FrameAction::Navigate { location: "https://b.example/".into() }]
        );

        // Later loads of the same frame do not navigate again.
        manager.handle_load(WindowId(7));
        assert!(manager.take_actions().is_empty());
    }

    #[test]
    fn missing_location_means_blank() {
        let mut manager = loaded_manager();
        assert_eq!(manager.set_frame_location(None), BLANK_LOCATION);
        assert_eq!(manager.set_frame_location(Some("")), BLANK_LOCATION);
        assert_eq!(manager.expected_client_origin(), None);
    }

    #[test]
    fn relative_location_resolves_against_host() {
        let host = Url::parse("https://host.example/shell/").unwrap();
        let mut manager = FrameManager::new(Some(host));
        manager.set_frame_location(Some("/client/#/"));
        assert_eq!(manager.expected_client_origin().unwrap().as_str(), "https://host.example");
    }

    #[test]
    fn send_targets_exact_origin() {
        let mut manager = loaded_manager();
        let publication = Publication::new("t", json!(1));
        assert_eq!(manager.send_to_client(HostToClient::Publish(publication)), Ok(true));

        let actions = manager.take_actions();
        let [FrameAction::PostMessage { message, target_origin }] = actions.as_slice() else {
            unreachable!("expected a single post, got {actions:?}");
        };
        assert_eq!(target_origin, CLIENT);
        assert_eq!(message["msgType"], "publish");
        assert_eq!(message["direction"], "HostToClient");
    }

    #[test]
    fn send_without_origin_is_silent_noop() {
        let mut manager = FrameManager::new(None);
        manager.handle_load(WindowId(1));
        manager.take_actions();

        assert_eq!(manager.send_to_client(HostToClient::UnloadRequest), Ok(false));
        assert!(manager.take_actions().is_empty());
    }

    #[test]
    fn send_before_load_is_silent_noop() {
        let mut manager = FrameManager::new(None);
        manager.set_frame_location(Some("https://client.example/"));
        manager.take_actions();

        assert_eq!(manager.send_to_client(HostToClient::UnloadRequest), Ok(false));
        assert!(manager.take_actions().is_empty());
    }

    #[test]
    fn accepts_message_from_frame() {
        let mut manager = loaded_manager();
        let received = manager.handle_message(event(started(), CLIENT, Some(WindowId(1)))).unwrap();
        assert_eq!(received.map(|e| e.message), Some(ClientToHost::ClientStarted));
    }

    #[test]
    fn rejects_wrong_origin_even_if_valid() {
        let mut manager = loaded_manager();
        let received =
            manager.handle_message(event(started(), "https://evil.example", Some(WindowId(1))));
        assert_eq!(received, Ok(None));
    }

    #[test]
    fn rejects_wrong_source_even_with_right_origin() {
        let mut manager = loaded_manager();
        assert_eq!(manager.handle_message(event(started(), CLIENT, Some(WindowId(2)))), Ok(None));
        assert_eq!(manager.handle_message(event(started(), CLIENT, None)), Ok(None));
    }

    #[test]
    fn spoofed_garbage_never_reaches_decoder() {
        let mut manager = loaded_manager();
        let garbage = json!({"protocol": "iframe-coordinator", "msgType": "teleport"});
        assert_eq!(
            manager.handle_message(event(garbage.clone(), "https://evil.example", Some(WindowId(1)))),
            Ok(None)
        );
        assert!(manager.handle_message(event(garbage, CLIENT, Some(WindowId(1)))).is_err());
    }

    #[test]
    fn ignores_messages_while_not_listening() {
        let mut manager = loaded_manager();
        manager.stop_message_handler();
        assert_eq!(manager.handle_message(event(started(), CLIENT, Some(WindowId(1)))), Ok(None));
    }

    #[test]
    fn foreign_traffic_is_ignored() {
        let mut manager = loaded_manager();
        let foreign = json!({"type": "webpackOk"});
        assert_eq!(manager.handle_message(event(foreign, CLIENT, Some(WindowId(1)))), Ok(None));
    }

    #[test]
    fn click_fired_dispatches_synthetic_click() {
        let mut manager = loaded_manager();
        let click = Envelope::new(ClientToHost::ClickFired(Default::default())).encode().unwrap();
        manager.handle_message(event(click, CLIENT, Some(WindowId(1)))).unwrap();
        assert_eq!(manager.take_actions(), vec![FrameAction::Click]);
    }

    #[test]
    fn message_handler_is_idempotent() {
        let mut manager = FrameManager::new(None);
        manager.take_actions();
        manager.start_message_handler();
        manager.start_message_handler();
        manager.stop_message_handler();
        manager.stop_message_handler();
        assert_eq!(
            manager.take_actions(),
            vec![FrameAction::AddMessageListener, FrameAction::RemoveMessageListener]
        );
    }

    #[test]
    fn origin_follows_navigation() {
        let mut manager = loaded_manager();
        manager.set_frame_location(Some("https://other.example/"));
        assert_eq!(manager.handle_message(event(started(), CLIENT, Some(WindowId(1)))), Ok(None));
        let received = manager
            .handle_message(event(started(), "https://other.example", Some(WindowId(1))))
            .unwrap();
        assert!(received.is_some());
    }
}

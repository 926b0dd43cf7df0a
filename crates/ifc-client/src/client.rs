//! Client state machine.
//!
//! The `Client` is the client half of the protocol: it announces itself with
//! `client_started`, receives the host environment in `env_init`, exchanges
//! publications, and sends requests to the host.
//!
//! ```text
//! NotStarted --start--> Started --stop--> Stopped
//!                          ^                 |
//!                          +-----start-------+
//! ```
//!
//! Environment data is absent until the first `env_init` and is replaced by
//! every later one.

use std::collections::BTreeSet;

use ifc_core::urls::join_routes;
use ifc_proto::{
    ClientToHost, Envelope, HostToClient, Inbound, Message, validate_incoming, validate_outgoing,
    payloads::{
        input::{ClickData, KeyData},
        lifecycle::EnvInit,
        pubsub::Publication,
        requests::{ModalRequest, NavRequest, Notification, PageMetadata, PromptOnLeave},
    },
};
use serde_json::Value;

use crate::{
    config::{ClientConfig, Embedding},
    error::ClientError,
    event::{ClientAction, ClientEvent, InboundMessage},
};

/// Target origin used by frame clients without a configured host origin.
const ANY_ORIGIN: &str = "*";

/// Client lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientState {
    /// Never started.
    #[default]
    NotStarted,
    /// Listening and announced to the host.
    Started,
    /// Stopped; may be started again.
    Stopped,
}

/// Client-side protocol state machine.
#[derive(Debug, Clone, Default)]
pub struct Client {
    config: ClientConfig,
    state: ClientState,
    environment: Option<EnvInit>,
    subscriptions: BTreeSet<String>,
}

impl Client {
    /// Create a client with the given configuration.
    pub fn new(config: ClientConfig) -> Self {
        Self { config, ..Self::default() }
    }

    /// Configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Lifecycle state.
    pub fn state(&self) -> ClientState {
        self.state
    }

    /// Whether the client is started.
    pub fn is_started(&self) -> bool {
        self.state == ClientState::Started
    }

    /// Environment from the last `env_init`.
    pub fn environment(&self) -> Option<&EnvInit> {
        self.environment.as_ref()
    }

    /// Whether the client receives publications on `topic`.
    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.subscriptions.contains(topic)
    }

    /// Process a platform event and return resulting actions.
    pub fn handle(&mut self, event: ClientEvent) -> Result<Vec<ClientAction>, ClientError> {
        match event {
            ClientEvent::Start => self.handle_start(),
            ClientEvent::Stop => Ok(self.handle_stop()),
            ClientEvent::MessageReceived(message) => self.handle_message(message),
            ClientEvent::KeyDown(key) => self.handle_key_down(key),
            ClientEvent::Click(click) => self.handle_click(click),
        }
    }

    fn handle_start(&mut self) -> Result<Vec<ClientAction>, ClientError> {
        if self.is_started() {
            return Ok(Vec::new());
        }

        self.state = ClientState::Started;
        let mut actions = vec![ClientAction::AddMessageListener];
        if !self.config.embedding.is_worker() {
            actions.push(ClientAction::AddInputListeners);
        }
        actions.push(self.post(ClientToHost::ClientStarted)?);

        tracing::info!(worker = self.config.embedding.is_worker(), "client started");
        Ok(actions)
    }

    fn handle_stop(&mut self) -> Vec<ClientAction> {
        if !self.is_started() {
            return Vec::new();
        }

        self.state = ClientState::Stopped;
        let mut actions = vec![ClientAction::RemoveMessageListener];
        if !self.config.embedding.is_worker() {
            actions.push(ClientAction::RemoveInputListeners);
        }
        tracing::info!("client stopped");
        actions
    }

    fn handle_message(
        &mut self,
        message: InboundMessage,
    ) -> Result<Vec<ClientAction>, ClientError> {
        if !self.is_started() {
            return Ok(Vec::new());
        }

        if let Embedding::Frame { host_origin } = &self.config.embedding {
            if !message.from_parent {
                tracing::trace!(origin = %message.origin, "ignoring message not from parent");
                return Ok(Vec::new());
            }
            if host_origin.as_ref().is_some_and(|expected| *expected != message.origin) {
                tracing::debug!(origin = %message.origin, "ignoring message from unexpected origin");
                return Ok(Vec::new());
            }
        }

        let envelope = match validate_incoming::<HostToClient>(&message.data) {
            Ok(Inbound::Accepted(envelope)) => envelope,
            Ok(Inbound::Foreign | Inbound::Misdirected) => return Ok(Vec::new()),
            Err(e) => {
                tracing::warn!(origin = %message.origin, error = %e, "invalid message from host");
                return Err(e.into());
            },
        };

        match envelope.message {
            HostToClient::EnvInit(init) => {
                tracing::debug!(assigned_route = %init.assigned_route, "environment received");
                self.environment = Some(init.clone());
                Ok(vec![ClientAction::EnvironmentChanged(init)])
            },
            HostToClient::Publish(publication) => {
                if !self.is_subscribed(&publication.topic) {
                    tracing::trace!(topic = %publication.topic, "no subscription; dropped");
                    return Ok(Vec::new());
                }
                Ok(vec![ClientAction::Deliver(publication)])
            },
            HostToClient::UnloadRequest => {
                if !self.config.embedding.is_worker() {
                    tracing::debug!("unload_request ignored by frame client");
                    return Ok(Vec::new());
                }
                Ok(vec![ClientAction::UnloadRequested])
            },
        }
    }

    fn handle_key_down(&mut self, key: KeyData) -> Result<Vec<ClientAction>, ClientError> {
        if !self.is_started() {
            return Ok(Vec::new());
        }

        let registered = self
            .environment
            .as_ref()
            .and_then(|env| env.registered_keys.as_deref())
            .unwrap_or_default();
        if !registered.iter().any(|chord| chord.matches(&key)) {
            return Ok(Vec::new());
        }

        Ok(vec![self.post(ClientToHost::RegisteredKeyFired(key))?])
    }

    fn handle_click(&mut self, click: ClickData) -> Result<Vec<ClientAction>, ClientError> {
        if !self.is_started() || self.config.embedding.is_worker() {
            return Ok(Vec::new());
        }
        Ok(vec![self.post(ClientToHost::ClickFired(click))?])
    }

    /// Receive host publications on `topic`.
    pub fn subscribe(&mut self, topic: impl Into<String>) {
        self.subscriptions.insert(topic.into());
    }

    /// Stop receiving host publications on `topic`.
    pub fn unsubscribe(&mut self, topic: &str) {
        self.subscriptions.remove(topic);
    }

    /// Publish to the host.
    pub fn publish(
        &mut self,
        topic: impl Into<String>,
        payload: Value,
    ) -> Result<Vec<ClientAction>, ClientError> {
        self.send(ClientToHost::Publish(Publication::new(topic, payload)))
    }

    /// Ask the host to navigate.
    pub fn request_navigation(
        &mut self,
        request: NavRequest,
    ) -> Result<Vec<ClientAction>, ClientError> {
        self.send(ClientToHost::NavRequest(request))
    }

    /// Ask the host to show a notification.
    pub fn request_notification(
        &mut self,
        notification: Notification,
    ) -> Result<Vec<ClientAction>, ClientError> {
        self.send(ClientToHost::NotifyRequest(notification))
    }

    /// Ask the host to open a modal.
    pub fn request_modal(
        &mut self,
        request: ModalRequest,
    ) -> Result<Vec<ClientAction>, ClientError> {
        self.send(ClientToHost::ModalRequest(request))
    }

    /// Report the page title and breadcrumbs.
    pub fn send_page_metadata(
        &mut self,
        metadata: PageMetadata,
    ) -> Result<Vec<ClientAction>, ClientError> {
        self.send(ClientToHost::PageMetadata(metadata))
    }

    /// Ask the host to confirm before navigating away.
    pub fn request_prompt_on_leave(
        &mut self,
        message: Option<String>,
    ) -> Result<Vec<ClientAction>, ClientError> {
        self.send(ClientToHost::PromptOnLeave(PromptOnLeave { should_prompt: true, message }))
    }

    /// Withdraw a previous leave confirmation request.
    pub fn clear_prompt_on_leave(&mut self) -> Result<Vec<ClientAction>, ClientError> {
        self.send(ClientToHost::PromptOnLeave(PromptOnLeave { should_prompt: false, message: None }))
    }

    /// Validate and send a partial `{msgType, msg}` message built by
    /// application code.
    ///
    /// # Errors
    ///
    /// - `ClientError::Protocol` wrapping `ProtocolError::InvalidOutgoing` if
    ///   the message is not a valid client-to-host message
    pub fn send_partial(&mut self, partial: &Value) -> Result<Vec<ClientAction>, ClientError> {
        let envelope = validate_outgoing::<ClientToHost>(partial)?;
        self.send(envelope.message)
    }

    /// Acknowledge an unload request and stop.
    ///
    /// # Errors
    ///
    /// - `ClientError::WorkerOnly` for frame clients
    pub fn acknowledge_unload(&mut self) -> Result<Vec<ClientAction>, ClientError> {
        if !self.config.embedding.is_worker() {
            return Err(ClientError::WorkerOnly { operation: "acknowledge_unload" });
        }

        let mut actions = self.send(ClientToHost::UnloadComplete)?;
        actions.extend(self.handle_stop());
        Ok(actions)
    }

    /// Absolute URL for a path inside this client's assigned route.
    ///
    /// # Errors
    ///
    /// - `ClientError::EnvironmentNotReady` before `env_init`
    pub fn url_from_client_path(&self, client_path: &str) -> Result<String, ClientError> {
        let env = self.environment.as_ref().ok_or(ClientError::EnvironmentNotReady)?;
        Ok(join_routes([env.host_root_url.as_str(), env.assigned_route.as_str(), client_path]))
    }

    /// Absolute URL for a path in the host's routing space.
    ///
    /// # Errors
    ///
    /// - `ClientError::EnvironmentNotReady` before `env_init`
    pub fn url_from_host_path(&self, host_path: &str) -> Result<String, ClientError> {
        let env = self.environment.as_ref().ok_or(ClientError::EnvironmentNotReady)?;
        Ok(join_routes([env.host_root_url.as_str(), host_path]))
    }

    /// Send an application message. Dropped unless started.
    fn send(&mut self, message: ClientToHost) -> Result<Vec<ClientAction>, ClientError> {
        if !self.is_started() {
            tracing::debug!(msg_type = %message.msg_type(), "client not started; message dropped");
            return Ok(Vec::new());
        }
        Ok(vec![self.post(message)?])
    }

    fn post(&self, message: ClientToHost) -> Result<ClientAction, ClientError> {
        let message = Envelope::new(message).encode()?;
        let target_origin = match &self.config.embedding {
            Embedding::Frame { host_origin } => {
                Some(host_origin.clone().unwrap_or_else(|| ANY_ORIGIN.to_string()))
            },
            Embedding::Worker => None,
        };
        Ok(ClientAction::PostMessage { message, target_origin })
    }
}

//! The host element: one frame following the host's route.
//!
//! [`FrameRouter`] combines route resolution with a frame transport. Setting
//! the `route` attribute resolves the owning client, points the frame at the
//! client URL, applies the registration's frame attributes and rebinds the
//! coordinator so the next handshake carries the right assigned route.

use ifc_core::{ClientRouter, EnvironmentData, Lifecycle, RoutingMap, Url};
use serde_json::Value;

use crate::{
    ClientBinding, FrameAction, FrameManager, HostCoordinator, HostError, HostEvent, MessageEvent,
    WindowId,
};

/// Observed attribute carrying the host route.
pub const ROUTE_ATTRIBUTE: &str = "route";

/// Configuration of a [`FrameRouter`].
#[derive(Debug, Clone, Default)]
pub struct FrameRouterConfig {
    /// Registered clients.
    pub clients: RoutingMap,
    /// Environment shared with every client.
    pub environment: EnvironmentData,
    /// Host page URL, used to resolve relative client URLs.
    pub host_url: Option<Url>,
}

/// Route-following frame host.
#[derive(Debug, Clone)]
pub struct FrameRouter {
    router: ClientRouter,
    coordinator: HostCoordinator<FrameManager>,
    host_url: Option<Url>,
    route: Option<String>,
}

impl FrameRouter {
    /// Host for `config`.
    ///
    /// # Errors
    ///
    /// - `HostError::Router` if a client URL is invalid
    pub fn new(config: FrameRouterConfig) -> Result<Self, HostError> {
        let router = build_router(&config.clients, config.host_url.as_ref())?;
        let frame = FrameManager::new(config.host_url.clone());
        Ok(Self {
            router,
            coordinator: HostCoordinator::new(frame, config.environment),
            host_url: config.host_url,
            route: None,
        })
    }

    /// Replace the registered clients and re-resolve the current route.
    ///
    /// # Errors
    ///
    /// - `HostError::Router` if a client URL is invalid; the previous
    ///   configuration stays in effect
    pub fn set_clients(&mut self, clients: &RoutingMap) -> Result<(), HostError> {
        self.router = build_router(clients, self.host_url.as_ref())?;
        if let Some(route) = self.route.clone() {
            self.apply_route(&route, true);
        }
        Ok(())
    }

    /// Replace the shared environment.
    pub fn set_environment(&mut self, environment: EnvironmentData) {
        self.coordinator.set_environment(environment);
    }

    /// Current route, if any was set.
    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    /// Client owning the current route.
    pub fn current_client(&self) -> Option<&str> {
        self.coordinator.client().map(|c| c.id.as_str())
    }

    /// The managed frame.
    pub fn frame(&self) -> &FrameManager {
        self.coordinator.transport()
    }

    /// Follow a new host route.
    pub fn set_route(&mut self, route: &str) {
        self.apply_route(route, false);
    }

    /// Resolve `route` and update the frame. Registration attributes are
    /// reapplied when the client changes or `reconfigured` is set.
    fn apply_route(&mut self, route: &str, reconfigured: bool) {
        self.route = Some(route.to_string());

        let target = self.router.get_client_target(route);
        let previous = self.coordinator.client().map(|c| c.id.clone());
        let current = target.as_ref().map(|t| t.id.clone());

        let frame = self.coordinator.transport_mut();
        let location = frame.set_frame_location(target.as_ref().map(|t| t.url.as_str()));

        if reconfigured || previous != current {
            match &target {
                Some(target) => {
                    frame.set_frame_allow(target.allow.as_deref());
                    frame.set_frame_sandbox(target.sandbox.as_deref());
                    frame.set_frame_default_title(target.default_title.as_deref());
                },
                None => {
                    frame.set_frame_allow(None);
                    frame.set_frame_sandbox(None);
                    frame.set_frame_default_title(None);
                },
            }
            self.coordinator.bind_client(
                target.as_ref().map(|t| ClientBinding::new(t.id.clone(), t.assigned_route.clone())),
            );
        }

        if target.is_none() {
            tracing::info!(route, "no client owns route");
            self.coordinator.push_event(HostEvent::ClientNotFound { route: route.to_string() });
        }
        if previous != current {
            tracing::info!(?previous, ?current, "client changed");
            self.coordinator.push_event(HostEvent::ClientChanged { previous, current });
        }
        self.coordinator.push_event(HostEvent::FrameTransition { location });
    }

    /// The frame fired `load` with content window `window`.
    pub fn handle_load(&mut self, window: WindowId) {
        self.coordinator.transport_mut().handle_load(window);
    }

    /// A `message` event reached the host window.
    ///
    /// # Errors
    ///
    /// - `HostError::Protocol` if the current client sent an invalid message
    pub fn handle_message(&mut self, event: MessageEvent) -> Result<(), HostError> {
        self.coordinator.handle_inbound(event)
    }

    /// Forward client publications on `topic` to the host.
    pub fn subscribe(&mut self, topic: impl Into<String>) {
        self.coordinator.subscribe(topic);
    }

    /// Stop forwarding publications on `topic`.
    pub fn unsubscribe(&mut self, topic: &str) {
        self.coordinator.unsubscribe(topic);
    }

    /// Publish to the current client.
    ///
    /// # Errors
    ///
    /// - `HostError::Protocol` if the payload cannot be encoded
    pub fn publish(&mut self, topic: impl Into<String>, payload: Value) -> Result<bool, HostError> {
        self.coordinator.publish(topic, payload)
    }

    /// Drain pending host events.
    pub fn take_events(&mut self) -> Vec<HostEvent> {
        self.coordinator.take_events()
    }

    /// Drain pending platform actions.
    pub fn take_actions(&mut self) -> Vec<FrameAction> {
        self.coordinator.take_actions()
    }
}

impl Lifecycle for FrameRouter {
    fn on_attach(&mut self) {
        self.coordinator.transport_mut().start_message_handler();
    }

    fn on_detach(&mut self) {
        self.coordinator.transport_mut().stop_message_handler();
    }

    fn on_attribute_change(&mut self, name: &str, value: Option<&str>) {
        if name == ROUTE_ATTRIBUTE {
            self.set_route(value.unwrap_or_default());
        }
    }
}

/// Router over `clients`, resolving relative URLs against `host_url`.
pub(crate) fn build_router(
    clients: &RoutingMap,
    host_url: Option<&Url>,
) -> Result<ClientRouter, HostError> {
    let router = match host_url {
        Some(host_url) => ClientRouter::with_host_url(clients, host_url)?,
        None => ClientRouter::new(clients)?,
    };
    Ok(router)
}

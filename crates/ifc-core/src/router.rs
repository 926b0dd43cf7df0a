//! Route resolution.
//!
//! Maps a host route to the client that owns it and to the URL the client's
//! frame should show. Each client owns a route prefix (`assignedRoute`); the
//! part of the route after that prefix is handed to the client in its own URL
//! scheme:
//!
//! ```text
//! registration  url = "https://apps.example/orders/#/"  assignedRoute = "/orders"
//! route         "orders/123/edit"
//! target        "https://apps.example/orders/#/123/edit"
//! ```
//!
//! # Invariants
//!
//! - Specificity: when several registrations prefix-match a route, the one
//!   with the longest normalized `assignedRoute` wins, whatever the
//!   registration order.
//! - Determinism: equal-length matches resolve to the smallest client id.
//! - The trailing slash of the remainder is preserved, so callers can tell an
//!   exact route from a sub-route.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{error::RouterError, urls::strip_slashes};

/// Identifier of a registered client.
pub type ClientId = String;

/// Static configuration for one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRegistration {
    /// Client application URL. A non-empty fragment selects fragment routing.
    pub url: String,

    /// Route prefix owned by the client.
    pub assigned_route: String,

    /// Feature policy for the frame (`allow` attribute).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow: Option<String>,

    /// Extra sandbox tokens, merged with the mandatory defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sandbox: Option<String>,

    /// Accessible frame title used until the client reports its own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_title: Option<String>,
}

impl ClientRegistration {
    /// Registration with only the required fields.
    pub fn new(url: impl Into<String>, assigned_route: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            assigned_route: assigned_route.into(),
            allow: None,
            sandbox: None,
            default_title: None,
        }
    }
}

/// Client id to registration.
///
/// Ordered so that resolution and iteration are deterministic.
pub type RoutingMap = BTreeMap<ClientId, ClientRegistration>;

/// Result of resolving a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientTarget {
    /// Registration key of the owning client.
    pub id: ClientId,
    /// URL the client frame should load.
    pub url: String,
    /// Normalized route prefix owned by the client.
    pub assigned_route: String,
    /// Feature policy from the registration.
    pub allow: Option<String>,
    /// Extra sandbox tokens from the registration.
    pub sandbox: Option<String>,
    /// Default frame title from the registration.
    pub default_title: Option<String>,
}

/// Registration prepared for matching.
#[derive(Debug, Clone)]
struct RouteEntry {
    id: ClientId,
    route: String,
    url: Url,
    registration: ClientRegistration,
}

/// Longest-prefix route resolver over a [`RoutingMap`].
#[derive(Debug, Clone, Default)]
pub struct ClientRouter {
    entries: Vec<RouteEntry>,
}

impl ClientRouter {
    /// Build a router from absolute client URLs.
    ///
    /// # Errors
    ///
    /// - `RouterError::InvalidClientUrl` if any registration URL is not an
    ///   absolute URL
    pub fn new(clients: &RoutingMap) -> Result<Self, RouterError> {
        Self::build(clients, None)
    }

    /// Build a router, resolving relative client URLs against the host page.
    ///
    /// # Errors
    ///
    /// - `RouterError::InvalidClientUrl` if a registration URL cannot be
    ///   resolved against `host_url`
    pub fn with_host_url(clients: &RoutingMap, host_url: &Url) -> Result<Self, RouterError> {
        Self::build(clients, Some(host_url))
    }

    fn build(clients: &RoutingMap, base: Option<&Url>) -> Result<Self, RouterError> {
        let entries = clients
            .iter()
            .map(|(id, registration)| {
                let parsed = match base {
                    Some(base) => base.join(&registration.url),
                    None => Url::parse(&registration.url),
                };
                let url = parsed.map_err(|e| RouterError::InvalidClientUrl {
                    client_id: id.clone(),
                    url: registration.url.clone(),
                    reason: e.to_string(),
                })?;

                Ok(RouteEntry {
                    id: id.clone(),
                    route: normalize_route(&registration.assigned_route).to_string(),
                    url,
                    registration: registration.clone(),
                })
            })
            .collect::<Result<Vec<_>, RouterError>>()?;

        Ok(Self { entries })
    }

    /// Number of registered clients.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no clients are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Normalized assigned route of a client. `None` if not registered.
    pub fn assigned_route(&self, client_id: &str) -> Option<&str> {
        self.entries.iter().find(|e| e.id == client_id).map(|e| e.route.as_str())
    }

    /// Resolve a host route to its client target.
    ///
    /// `None` if no registration owns the route; the caller should then point
    /// the frame at a neutral location.
    pub fn get_client_target(&self, route: &str) -> Option<ClientTarget> {
        let route = route.strip_prefix('/').unwrap_or(route);

        // Entries are in ascending id order; strict comparison keeps the
        // smallest id on equal-length matches.
        let mut best: Option<&RouteEntry> = None;
        for entry in &self.entries {
            if route.starts_with(entry.route.as_str())
                && best.is_none_or(|b| entry.route.len() > b.route.len())
            {
                best = Some(entry);
            }
        }

        let entry = best?;
        let remainder = route[entry.route.len()..].trim_start_matches('/');
        let url = apply_route(&entry.url, remainder);

        tracing::debug!(route, client_id = %entry.id, %url, "route resolved");

        Some(ClientTarget {
            id: entry.id.clone(),
            url,
            assigned_route: entry.route.clone(),
            allow: entry.registration.allow.clone(),
            sandbox: entry.registration.sandbox.clone(),
            default_title: entry.registration.default_title.clone(),
        })
    }
}

/// Parse the host page URL that relative client URLs are resolved against.
///
/// # Errors
///
/// - `RouterError::InvalidHostUrl` if `url` is not an absolute URL
pub fn parse_host_url(url: &str) -> Result<Url, RouterError> {
    Url::parse(url)
        .map_err(|e| RouterError::InvalidHostUrl { url: url.to_string(), reason: e.to_string() })
}

/// Strip leading and trailing slashes from an assigned route.
pub fn normalize_route(route: &str) -> &str {
    strip_slashes(route)
}

/// Append `remainder` to a client URL in the client's routing scheme.
fn apply_route(client_url: &Url, remainder: &str) -> String {
    let mut url = client_url.clone();

    match client_url.fragment() {
        Some(fragment) if !fragment.is_empty() => {
            let base = fragment.strip_suffix('/').unwrap_or(fragment);
            url.set_fragment(Some(&format!("{base}/{remainder}")));
        },
        _ => {
            let path = client_url.path();
            let base = path.strip_suffix('/').unwrap_or(path);
            url.set_path(&format!("{base}/{remainder}"));
        },
    }

    url.to_string()
}

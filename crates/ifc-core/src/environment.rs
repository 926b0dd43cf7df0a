//! Host environment data.
//!
//! Configured once by the embedding application and sent to every client in
//! its `env_init` message, together with the route prefix that client owns.

use ifc_proto::payloads::{input::KeyData, lifecycle::EnvInit};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::urls::join_routes;

/// Environment shared with every client.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentData {
    /// Host locale (BCP 47 tag).
    pub locale: String,

    /// Root URL of the host application; client links are built under it.
    pub host_root_url: String,

    /// Global key chords clients should report back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered_keys: Option<Vec<KeyData>>,

    /// Opaque host-defined data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<Value>,
}

impl EnvironmentData {
    /// `env_init` payload for a client owning `assigned_route`.
    pub fn env_init(&self, assigned_route: &str) -> EnvInit {
        EnvInit {
            locale: self.locale.clone(),
            host_root_url: self.host_root_url.clone(),
            assigned_route: assigned_route.to_string(),
            registered_keys: self.registered_keys.clone(),
            custom: self.custom.clone(),
        }
    }

    /// Absolute URL for a path in the host's routing space.
    pub fn url_from_host_path(&self, host_path: &str) -> String {
        join_routes([self.host_root_url.as_str(), host_path])
    }
}

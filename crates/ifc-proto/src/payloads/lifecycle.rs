//! Lifecycle payloads.
//!
//! The handshake is `client_started` (no payload) answered by `env_init`.
//! Worker clients additionally understand `unload_request` and answer with
//! `unload_complete`; neither carries a payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::payloads::input::KeyData;

/// Environment data sent by the host once a client has started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvInit {
    /// Host locale (BCP 47 tag).
    pub locale: String,

    /// Root URL of the host application.
    pub host_root_url: String,

    /// Route prefix the receiving client owns in the host.
    pub assigned_route: String,

    /// Key chords the client should report back via `registeredKeyFired`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered_keys: Option<Vec<KeyData>>,

    /// Opaque host-defined data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<Value>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn optional_fields_may_be_absent() {
        let decoded: EnvInit = serde_json::from_value(json!({
            "locale": "en-US",
            "hostRootUrl": "https://host.example/#/",
            "assignedRoute": "app1",
        }))
        .unwrap();

        assert_eq!(decoded.registered_keys, None);
        assert_eq!(decoded.custom, None);
    }

    #[test]
    fn assigned_route_is_required() {
        let decoded = serde_json::from_value::<EnvInit>(json!({
            "locale": "en-US",
            "hostRootUrl": "https://host.example/",
        }));
        assert!(decoded.is_err());
    }
}

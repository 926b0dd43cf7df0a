//! Pub/sub payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A publication on a topic.
///
/// `payload` is opaque to the bus: any JSON value is carried as-is, but the
/// field itself must be present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Publication {
    /// Topic the publication is filed under.
    pub topic: String,

    /// Opaque publication data.
    pub payload: Value,

    /// Client the publication came from.
    ///
    /// Set by the host when a publication arrives from a client so multi-client
    /// hosts can tell sources apart. Clients never need to set it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

impl Publication {
    /// Create a publication without a source annotation.
    pub fn new(topic: impl Into<String>, payload: Value) -> Self {
        Self { topic: topic.into(), payload, client_id: None }
    }

    /// Copy of this publication annotated with the originating client.
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn null_payload_counts_as_present() {
        let decoded: Publication =
            serde_json::from_value(json!({"topic": "t", "payload": null})).unwrap();
        assert_eq!(decoded.payload, Value::Null);
    }

    #[test]
    fn missing_payload_is_rejected() {
        let decoded = serde_json::from_value::<Publication>(json!({"topic": "t"}));
        assert!(decoded.is_err());
    }

    #[test]
    fn client_id_is_camel_case() {
        let publication = Publication::new("t", json!(1)).with_client_id("app1");
        let value = serde_json::to_value(&publication).unwrap();
        assert_eq!(value, json!({"topic": "t", "payload": 1, "clientId": "app1"}));
    }
}

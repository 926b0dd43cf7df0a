//! Client configuration.

use serde::{Deserialize, Serialize};

/// How the client is embedded in its host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Embedding {
    /// Document inside an iframe; the host is the parent window.
    #[serde(rename_all = "camelCase")]
    Frame {
        /// Expected host origin. When set, only messages from this origin
        /// are accepted and outgoing messages are restricted to it; when
        /// absent, messages are posted to `*`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        host_origin: Option<String>,
    },

    /// Dedicated worker; the host is whoever spawned it.
    Worker,
}

impl Default for Embedding {
    fn default() -> Self {
        Self::Frame { host_origin: None }
    }
}

impl Embedding {
    /// Whether the client runs in a worker.
    pub fn is_worker(&self) -> bool {
        matches!(self, Self::Worker)
    }
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    /// Embedding of this client.
    pub embedding: Embedding,
}

impl ClientConfig {
    /// Frame client that only talks to `host_origin`.
    pub fn frame(host_origin: impl Into<String>) -> Self {
        Self { embedding: Embedding::Frame { host_origin: Some(host_origin.into()) } }
    }

    /// Worker client.
    pub fn worker() -> Self {
        Self { embedding: Embedding::Worker }
    }
}

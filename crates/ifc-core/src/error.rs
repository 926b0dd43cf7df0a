//! Error types for route resolution and configuration.
//!
//! Everything here is a misconfiguration: it surfaces while the host is being
//! set up, never while messages are flowing.

use thiserror::Error;

/// Errors raised while building a router or deriving URLs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// A registration's URL cannot be parsed (or resolved against the host).
    #[error("client {client_id:?} has invalid url {url:?}: {reason}")]
    InvalidClientUrl {
        /// Registration key.
        client_id: String,
        /// URL as configured.
        url: String,
        /// Parser failure.
        reason: String,
    },

    /// The host page URL used to resolve relative client URLs is invalid.
    #[error("invalid host url {url:?}: {reason}")]
    InvalidHostUrl {
        /// URL as configured.
        url: String,
        /// Parser failure.
        reason: String,
    },
}

impl RouterError {
    /// Registration the error belongs to, if any.
    pub fn client_id(&self) -> Option<&str> {
        match self {
            Self::InvalidClientUrl { client_id, .. } => Some(client_id),
            Self::InvalidHostUrl { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_name_the_client() {
        let err = RouterError::InvalidClientUrl {
            client_id: "app1".into(),
            url: "http://[::1".into(),
            reason: "invalid IPv6 address".into(),
        };
        assert_eq!(err.client_id(), Some("app1"));
        assert!(err.to_string().contains("app1"));

        let err = RouterError::InvalidHostUrl { url: "nope".into(), reason: "relative".into() };
        assert_eq!(err.client_id(), None);
    }
}

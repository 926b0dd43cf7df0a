//! Host error types.
//!
//! Untrusted traffic that is merely *not ours* never produces an error; it is
//! dropped by the transports. Errors are reserved for data tagged with our
//! protocol that fails validation, for invalid locally built messages, and
//! for misconfiguration.

use ifc_core::RouterError;
use ifc_proto::ProtocolError;
use thiserror::Error;

/// Errors raised by host components.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// Message validation failed (incoming protocol violation or invalid
    /// outgoing message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Routing configuration is invalid.
    #[error(transparent)]
    Router(#[from] RouterError),

    /// Worker pool configuration was changed while workers were running.
    #[error("worker pool is running; stop it before reconfiguring")]
    PoolRunning,

    /// Worker was spawned while a previous instance is still alive.
    #[error("worker for client {client_id:?} is already running")]
    WorkerAlive {
        /// Registration key of the worker client.
        client_id: String,
    },

    /// Operation names a client that is not registered.
    #[error("unknown client {0:?}")]
    UnknownClient(String),
}

impl HostError {
    /// Whether a peer sent bad data, as opposed to a local bug or
    /// misconfiguration.
    pub fn is_protocol_violation(&self) -> bool {
        match self {
            Self::Protocol(e) => !matches!(e, ProtocolError::InvalidOutgoing { .. }),
            Self::Router(_) | Self::PoolRunning | Self::WorkerAlive { .. } | Self::UnknownClient(_) => {
                false
            },
        }
    }
}

//! Client error types.

use ifc_proto::ProtocolError;
use thiserror::Error;

/// Errors raised by the client state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Message validation failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// An operation needs the host environment, which arrives with
    /// `env_init`.
    #[error("host environment not received yet")]
    EnvironmentNotReady,

    /// Operation is not available for this embedding.
    #[error("{operation} is only available to worker clients")]
    WorkerOnly {
        /// Operation that was attempted.
        operation: &'static str,
    },
}

impl ClientError {
    /// Whether the host sent bad data, as opposed to a local bug or a call
    /// made too early.
    pub fn is_protocol_violation(&self) -> bool {
        match self {
            Self::Protocol(e) => !matches!(e, ProtocolError::InvalidOutgoing { .. }),
            Self::EnvironmentNotReady | Self::WorkerOnly { .. } => false,
        }
    }
}

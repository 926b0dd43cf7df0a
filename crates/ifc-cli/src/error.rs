//! CLI error types.

use std::path::PathBuf;

use ifc_host::HostError;
use thiserror::Error;

/// Errors that stop a command.
#[derive(Error, Debug)]
pub enum CliError {
    /// A file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying failure.
        source: std::io::Error,
    },

    /// A file is not valid JSON or does not match the expected shape.
    #[error("cannot parse {}: {source}", path.display())]
    Json {
        /// File that was being parsed.
        path: PathBuf,
        /// Underlying failure.
        source: serde_json::Error,
    },

    /// The configuration is well-formed but cannot be used.
    #[error("invalid configuration: {0}")]
    Config(#[from] HostError),

    /// Some checked messages violate the protocol.
    #[error("{count} of {total} messages violate the protocol")]
    InvalidMessages {
        /// Number of violations.
        count: usize,
        /// Number of messages checked.
        total: usize,
    },
}

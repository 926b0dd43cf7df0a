//! Command line checks for iframe-coordinator hosts.
//!
//! Loads a host configuration file and answers the questions that come up
//! while wiring clients into a host: which client owns a route, whether a
//! captured message is valid, whether the configuration loads at all.
//!
//! # Components
//!
//! - [`HostConfig`]: the JSON configuration file
//! - [`commands`]: one function per subcommand, returning report lines
//! - [`CliError`]: everything that makes a command fail

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod commands;
mod config;
mod error;

pub use config::HostConfig;
pub use error::CliError;

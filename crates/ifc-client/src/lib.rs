//! Client
//!
//! Action-based client state machine for the iframe-coordinator bus. Runs
//! inside a client frame or worker and talks to the host that embeds it.
//!
//! # Architecture
//!
//! The client follows the same Sans-IO pattern as the host crate. Platform
//! events ([`ClientEvent`]) and application intents (methods on [`Client`])
//! go in; [`ClientAction`]s come out for the caller to execute: posting to
//! the host, installing listeners, and delivering data to the application.
//!
//! # Components
//!
//! - [`Client`]: lifecycle, environment, subscriptions and requests
//! - [`ClientConfig`]: frame or worker embedding
//! - [`ClientEvent`]: events fed into the client
//! - [`ClientAction`]: actions produced by the client

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod client;
mod config;
mod error;
mod event;

pub use client::{Client, ClientState};
pub use config::{ClientConfig, Embedding};
pub use error::ClientError;
pub use event::{ClientAction, ClientEvent, InboundMessage};

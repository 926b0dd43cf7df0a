//! Core
//!
//! Pure building blocks shared by hosts and clients of the iframe-coordinator
//! bus. Nothing in this crate performs I/O.
//!
//! # Components
//!
//! - [`ClientRouter`]: longest-prefix resolution of host routes to clients
//! - [`Origin`]: origin derivation from a frame's current location
//! - [`urls`]: slash-normalizing route joins
//! - [`EnvironmentData`]: host configuration sent to clients on start
//! - [`Environment`]: clock abstraction for deterministic simulation
//! - [`Lifecycle`]: platform attach/detach hooks

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod env;
pub mod environment;
pub mod error;
pub mod lifecycle;
pub mod origin;
pub mod router;
pub mod urls;

pub use env::{Environment, SystemEnv};
pub use environment::EnvironmentData;
pub use error::RouterError;
pub use lifecycle::Lifecycle;
pub use origin::Origin;
pub use router::{ClientId, ClientRegistration, ClientRouter, ClientTarget, RoutingMap};
pub use url::Url;

//! Simulation harness for the iframe-coordinator bus.
//!
//! Runs real hosts and clients against a simulated browser so end-to-end
//! behavior can be tested deterministically: no DOM, no event loop, no wall
//! clock. Every message that crosses a window boundary is recorded in a
//! [`Trace`] that [`invariants`] are checked against.
//!
//! # Components
//!
//! - [`SimEnv`]: virtual clock implementing [`ifc_core::Environment`]
//! - [`SimPage`]: host window with a route-following frame and the client
//!   documents loaded into it
//! - [`SimWorkers`]: worker pool with one simulated worker per client
//! - [`Trace`]: record of deliveries, navigations and worker lifetimes
//!
//! # Browser model
//!
//! The simulation applies the delivery rules browsers enforce and the bus
//! relies on:
//!
//! - a `postMessage` to a frame reaches its document only if the target
//!   origin is `*` or equals the document's origin
//! - a message reaches a window only while that window has a listener
//! - navigating a frame replaces its document; the previous client is gone
//! - a terminated worker receives nothing

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
mod sim_env;
mod sim_page;
mod sim_workers;
mod trace;

pub use sim_env::SimEnv;
pub use sim_page::{ClientApp, SimDocument, SimPage};
pub use sim_workers::{SimWorker, SimWorkers};
pub use trace::{Delivery, Endpoint, Trace, TraceEntry};

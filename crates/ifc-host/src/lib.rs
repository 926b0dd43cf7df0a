//! Host
//!
//! Host-side state machines for the iframe-coordinator bus. Everything here
//! is Sans-IO: components consume platform events (messages, frame loads,
//! attribute changes, clock ticks) and produce platform actions and host
//! events, so the same code runs in a browser binding and in deterministic
//! simulation.
//!
//! # Components
//!
//! - [`FrameManager`]: one iframe, its navigation and origin-checked
//!   messaging
//! - [`WorkerManager`]: one dedicated worker and its cooperative unload
//! - [`HostCoordinator`]: handshake, pub/sub and requests over any
//!   [`ClientTransport`]
//! - [`FrameRouter`]: the host element that follows the host route
//! - [`WorkerPool`]: worker clients started and stopped together
//!
//! # Driving a component
//!
//! ```text
//! platform event ──> component.handle_*() ──> take_actions() ──> platform
//!                                         └─> take_events()  ──> host app
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod coordinator;
mod error;
mod event;
pub mod frame;
mod frame_router;
mod transport;
pub mod worker;
mod worker_pool;

pub use coordinator::{ClientBinding, HostCoordinator};
pub use error::HostError;
pub use event::HostEvent;
pub use frame::{FrameAction, FrameAttribute, FrameManager, MessageEvent, WindowId};
pub use frame_router::{FrameRouter, FrameRouterConfig, ROUTE_ATTRIBUTE};
pub use transport::ClientTransport;
pub use worker::{WorkerAction, WorkerConfig, WorkerId, WorkerManager, WorkerMessage, WorkerState};
pub use worker_pool::WorkerPool;

//! Worker transport.
//!
//! [`WorkerManager`] owns one dedicated worker running a client script.
//! Workers have no window and no origin check on their messages: the handle
//! that delivered a message is the only proof of where it came from, so
//! inbound messages must carry the [`WorkerId`] of the live instance.
//!
//! # Unload
//!
//! Stopping a worker is cooperative. The host posts `unload_request` and the
//! worker has [`WorkerConfig::unload_timeout`] to answer `unload_complete`;
//! after that it is terminated by force on the next [`WorkerManager::tick`].
//!
//! ```text
//! Idle --spawn--> Running --request_unload--> Unloading --ack--> Terminated
//!                    |                            |
//!                    +-------terminate------------+--timeout--> Terminated
//! ```

use std::{ops::Sub, time::Duration};

use ifc_core::{Origin, Url};
use ifc_proto::{ClientToHost, Envelope, HostToClient, Inbound, validate_incoming};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ClientTransport, HostError};

/// Default time a worker gets to acknowledge an unload request.
pub const DEFAULT_UNLOAD_TIMEOUT: Duration = Duration::from_millis(DEFAULT_UNLOAD_TIMEOUT_MS);

const DEFAULT_UNLOAD_TIMEOUT_MS: u64 = 3_000;

/// Opaque handle of a spawned worker instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(pub u64);

/// A message posted by a worker.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerMessage {
    /// Structured-clone payload.
    pub data: Value,
    /// Worker that posted it.
    pub source: WorkerId,
}

/// Worker tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkerConfig {
    /// Grace period between `unload_request` and forced termination, in
    /// milliseconds.
    pub unload_timeout_ms: u64,
}

impl WorkerConfig {
    /// Grace period between `unload_request` and forced termination.
    pub fn unload_timeout(&self) -> Duration {
        Duration::from_millis(self.unload_timeout_ms)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { unload_timeout_ms: DEFAULT_UNLOAD_TIMEOUT_MS }
    }
}

/// Platform effects requested by a [`WorkerManager`].
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerAction {
    /// `new Worker(script_url)`, known to the host as `worker`.
    Spawn {
        /// Handle for the new instance.
        worker: WorkerId,
        /// Script to run.
        script_url: String,
    },

    /// `worker.postMessage(message)`.
    PostMessage {
        /// Target instance.
        worker: WorkerId,
        /// Encoded envelope.
        message: Value,
    },

    /// `worker.terminate()`.
    Terminate {
        /// Instance to stop.
        worker: WorkerId,
    },
}

/// Worker lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState<I> {
    /// Never spawned.
    Idle,
    /// Spawned and accepting messages.
    Running,
    /// `unload_request` sent at `requested_at`; waiting for the ack.
    Unloading {
        /// When the request was sent.
        requested_at: I,
    },
    /// Instance gone.
    Terminated {
        /// Whether the unload timed out.
        forced: bool,
    },
}

/// Dedicated worker transport state machine.
///
/// Generic over the instant type so unload deadlines run on a virtual clock
/// in simulation.
#[derive(Debug, Clone)]
pub struct WorkerManager<I> {
    client_id: String,
    script_url: String,
    host_url: Option<Url>,
    config: WorkerConfig,
    worker: Option<WorkerId>,
    state: WorkerState<I>,
    actions: Vec<WorkerAction>,
}

impl<I> WorkerManager<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Manager for the worker client `client_id` running `script_url`.
    pub fn new(
        client_id: impl Into<String>,
        script_url: impl Into<String>,
        host_url: Option<Url>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            script_url: script_url.into(),
            host_url,
            config,
            worker: None,
            state: WorkerState::Idle,
            actions: Vec::new(),
        }
    }

    /// Registration key of the worker client.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WorkerState<I> {
        self.state
    }

    /// Handle of the live instance.
    pub fn worker(&self) -> Option<WorkerId> {
        match self.state {
            WorkerState::Running | WorkerState::Unloading { .. } => self.worker,
            WorkerState::Idle | WorkerState::Terminated { .. } => None,
        }
    }

    /// Whether an instance is alive.
    pub fn is_alive(&self) -> bool {
        self.worker().is_some()
    }

    /// Spawn a new instance under the handle `worker`.
    ///
    /// A terminated worker can be spawned again with a fresh handle.
    ///
    /// # Errors
    ///
    /// - `HostError::WorkerAlive` if an instance is still running or unloading
    pub fn spawn(&mut self, worker: WorkerId) -> Result<(), HostError> {
        if self.is_alive() {
            return Err(HostError::WorkerAlive { client_id: self.client_id.clone() });
        }

        tracing::debug!(client_id = %self.client_id, ?worker, script_url = %self.script_url, "spawning worker");
        self.worker = Some(worker);
        self.state = WorkerState::Running;
        self.actions.push(WorkerAction::Spawn { worker, script_url: self.script_url.clone() });
        Ok(())
    }

    /// Ask the worker to unload. No-op unless running.
    ///
    /// # Errors
    ///
    /// - `HostError::Protocol` if the request cannot be encoded
    pub fn request_unload(&mut self, now: I) -> Result<(), HostError> {
        if self.state != WorkerState::Running {
            return Ok(());
        }

        self.post(HostToClient::UnloadRequest)?;
        self.state = WorkerState::Unloading { requested_at: now };
        tracing::debug!(client_id = %self.client_id, "unload requested");
        Ok(())
    }

    /// Advance time. Returns `true` when the worker was terminated because
    /// its unload timed out.
    ///
    /// An instant before the unload request counts as no time elapsed.
    pub fn tick(&mut self, now: I) -> bool {
        let WorkerState::Unloading { requested_at } = self.state else {
            return false;
        };
        if now <= requested_at || now - requested_at < self.config.unload_timeout() {
            return false;
        }

        tracing::warn!(client_id = %self.client_id, "worker did not acknowledge unload; terminating");
        self.finish(true);
        true
    }

    /// Terminate the instance immediately.
    pub fn terminate(&mut self) {
        if self.is_alive() {
            self.finish(true);
        }
    }

    fn finish(&mut self, forced: bool) {
        if let Some(worker) = self.worker {
            self.actions.push(WorkerAction::Terminate { worker });
        }
        self.state = WorkerState::Terminated { forced };
    }

    fn post(&mut self, message: HostToClient) -> Result<bool, HostError> {
        let Some(worker) = self.worker() else {
            return Ok(false);
        };
        let message = Envelope::new(message).encode()?;
        self.actions.push(WorkerAction::PostMessage { worker, message });
        Ok(true)
    }

    /// Drain queued platform actions.
    pub fn take_actions(&mut self) -> Vec<WorkerAction> {
        std::mem::take(&mut self.actions)
    }
}

impl<I> ClientTransport for WorkerManager<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    type Inbound = WorkerMessage;
    type Action = WorkerAction;

    fn send_to_client(&mut self, message: HostToClient) -> Result<bool, HostError> {
        if self.state != WorkerState::Running {
            tracing::debug!(client_id = %self.client_id, "worker not running; message dropped");
            return Ok(false);
        }
        self.post(message)
    }

    fn expected_origin(&self) -> Option<Origin> {
        Origin::of(&self.script_url, self.host_url.as_ref())
    }

    fn receive(&mut self, inbound: WorkerMessage) -> Result<Option<Envelope<ClientToHost>>, HostError> {
        if self.worker() != Some(inbound.source) {
            tracing::debug!(client_id = %self.client_id, source = ?inbound.source, "ignoring message from stale worker");
            return Ok(None);
        }

        let envelope = match validate_incoming::<ClientToHost>(&inbound.data) {
            Ok(Inbound::Accepted(envelope)) => envelope,
            Ok(Inbound::Foreign | Inbound::Misdirected) => return Ok(None),
            Err(e) => {
                tracing::warn!(client_id = %self.client_id, error = %e, "invalid message from worker");
                return Err(e.into());
            },
        };

        if matches!(envelope.message, ClientToHost::UnloadComplete) {
            if !matches!(self.state, WorkerState::Unloading { .. }) {
                tracing::debug!(client_id = %self.client_id, "unsolicited unload_complete ignored");
                return Ok(None);
            }
            tracing::debug!(client_id = %self.client_id, "worker unloaded");
            self.finish(false);
        }

        Ok(Some(envelope))
    }

    fn take_actions(&mut self) -> Vec<WorkerAction> {
        WorkerManager::take_actions(self)
    }
}

//! Simulated dedicated workers.
//!
//! Wraps a [`WorkerPool`] and runs a worker [`Client`] for every spawned
//! instance. Workers acknowledge unload requests immediately unless their
//! script is marked as hanging, which lets tests exercise the forced
//! termination path with the virtual clock.

use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use ifc_client::{Client, ClientAction, ClientConfig, ClientError, ClientEvent, InboundMessage};
use ifc_core::{Environment, EnvironmentData, RoutingMap, Url};
use ifc_host::{
    HostError, HostEvent, WorkerAction, WorkerConfig, WorkerId, WorkerMessage, WorkerPool,
};
use serde_json::Value;

use crate::{Delivery, Endpoint, SimEnv, Trace, TraceEntry};

/// One running worker instance.
#[derive(Debug)]
pub struct SimWorker {
    /// Script the instance was created from.
    pub script_url: String,
    /// Client running inside the worker.
    pub client: Client,
    /// Environment updates, deliveries and unload requests the worker saw.
    pub received: Vec<ClientAction>,
}

/// Worker pool with simulated workers.
#[derive(Debug)]
pub struct SimWorkers {
    env: SimEnv,
    pool: WorkerPool<Duration>,
    workers: BTreeMap<WorkerId, SimWorker>,
    hanging: BTreeSet<String>,
    topics: Vec<String>,
    events: Vec<HostEvent>,
    host_errors: Vec<HostError>,
    client_errors: Vec<ClientError>,
    trace: Trace,
}

impl SimWorkers {
    /// Pool running `clients`, timed by `env`.
    ///
    /// # Errors
    ///
    /// - `HostError::Router` if a script URL cannot be resolved
    pub fn new(
        env: SimEnv,
        environment: EnvironmentData,
        host_url: Option<Url>,
        clients: RoutingMap,
        config: WorkerConfig,
    ) -> Result<Self, HostError> {
        let mut pool = WorkerPool::new(environment, host_url, config);
        pool.configure(clients)?;
        Ok(Self {
            env,
            pool,
            workers: BTreeMap::new(),
            hanging: BTreeSet::new(),
            topics: Vec::new(),
            events: Vec::new(),
            host_errors: Vec::new(),
            client_errors: Vec::new(),
            trace: Trace::new(),
        })
    }

    /// Instances of `script_url` never acknowledge an unload request.
    pub fn hang_on_unload(&mut self, script_url: impl Into<String>) {
        self.hanging.insert(script_url.into());
    }

    /// Every worker client subscribes to `topic`, including ones spawned
    /// later.
    pub fn worker_subscribe(&mut self, topic: impl Into<String>) {
        let topic = topic.into();
        for worker in self.workers.values_mut() {
            worker.client.subscribe(topic.clone());
        }
        self.topics.push(topic);
    }

    /// The pool.
    pub fn pool(&self) -> &WorkerPool<Duration> {
        &self.pool
    }

    /// Mutable pool, for host-side subscriptions and reconfiguration.
    pub fn pool_mut(&mut self) -> &mut WorkerPool<Duration> {
        &mut self.pool
    }

    /// Live worker instances.
    pub fn workers(&self) -> &BTreeMap<WorkerId, SimWorker> {
        &self.workers
    }

    /// Live instance of the worker registered as `client_id`.
    pub fn worker_of(&self, client_id: &str) -> Option<WorkerId> {
        self.pool.worker(client_id).and_then(|c| c.transport().worker())
    }

    /// Recorded messages and worker lifetimes.
    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    /// Drain host events.
    pub fn take_events(&mut self) -> Vec<HostEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drain errors raised by the pool.
    pub fn take_host_errors(&mut self) -> Vec<HostError> {
        std::mem::take(&mut self.host_errors)
    }

    /// Drain errors raised by worker clients.
    pub fn take_client_errors(&mut self) -> Vec<ClientError> {
        std::mem::take(&mut self.client_errors)
    }

    /// Start every worker.
    ///
    /// # Errors
    ///
    /// - see [`WorkerPool::start`]
    pub fn start(&mut self) -> Result<(), HostError> {
        self.pool.start()?;
        self.run();
        Ok(())
    }

    /// Ask every worker to unload.
    ///
    /// # Errors
    ///
    /// - see [`WorkerPool::stop`]
    pub fn stop(&mut self) -> Result<(), HostError> {
        self.pool.stop(self.env.now())?;
        self.run();
        Ok(())
    }

    /// Advance the virtual clock and let the pool enforce unload deadlines.
    pub fn advance(&mut self, by: Duration) {
        self.env.advance(by);
        self.pool.tick(self.env.now());
        self.run();
    }

    /// Host publishes to one worker.
    ///
    /// # Errors
    ///
    /// - see [`WorkerPool::publish`]
    pub fn host_publish(&mut self, client_id: &str, topic: &str, payload: Value) -> Result<bool, HostError> {
        let posted = self.pool.publish(client_id, topic, payload)?;
        self.run();
        Ok(posted)
    }

    /// Run `call` against the client inside `worker` and execute the actions
    /// it returns. Does nothing for unknown or terminated workers.
    ///
    /// # Errors
    ///
    /// - whatever `call` returns
    pub fn with_worker<F>(&mut self, worker: WorkerId, call: F) -> Result<(), ClientError>
    where
        F: FnOnce(&mut Client) -> Result<Vec<ClientAction>, ClientError>,
    {
        let Some(sim) = self.workers.get_mut(&worker) else {
            return Ok(());
        };
        let actions = call(&mut sim.client)?;
        self.execute_client_actions(worker, actions);
        self.run();
        Ok(())
    }

    fn run(&mut self) {
        loop {
            self.events.extend(self.pool.take_events());
            let actions = self.pool.take_actions();
            if actions.is_empty() {
                break;
            }
            for action in actions {
                self.execute_worker_action(action);
            }
        }
    }

    fn execute_worker_action(&mut self, action: WorkerAction) {
        match action {
            WorkerAction::Spawn { worker, script_url } => self.spawn(worker, script_url),
            WorkerAction::PostMessage { worker, message } => self.post_to_worker(worker, message),
            WorkerAction::Terminate { worker } => {
                self.workers.remove(&worker);
                self.trace.record(TraceEntry::Terminated { worker: worker.0 });
            },
        }
    }

    fn spawn(&mut self, worker: WorkerId, script_url: String) {
        self.trace.record(TraceEntry::Spawned { worker: worker.0 });

        let mut client = Client::new(ClientConfig::worker());
        for topic in &self.topics {
            client.subscribe(topic.clone());
        }
        let actions = match client.handle(ClientEvent::Start) {
            Ok(actions) => actions,
            Err(e) => {
                self.client_errors.push(e);
                Vec::new()
            },
        };
        self.workers.insert(worker, SimWorker { script_url, client, received: Vec::new() });
        self.execute_client_actions(worker, actions);
    }

    fn post_to_worker(&mut self, worker: WorkerId, message: Value) {
        let delivered = self.workers.get(&worker).is_some_and(|w| w.client.is_started());
        self.trace.record(TraceEntry::Post(Delivery {
            from: Endpoint::Host,
            to: Endpoint::Worker(worker.0),
            msg_type: Delivery::msg_type_of(&message),
            target_origin: None,
            recipient_origin: None,
            delivered,
        }));
        if !delivered {
            return;
        }

        let inbound = InboundMessage { data: message, origin: String::new(), from_parent: true };
        let Some(sim) = self.workers.get_mut(&worker) else {
            return;
        };
        match sim.client.handle(ClientEvent::MessageReceived(inbound)) {
            Ok(actions) => self.execute_client_actions(worker, actions),
            Err(e) => self.client_errors.push(e),
        }
    }

    fn execute_client_actions(&mut self, worker: WorkerId, actions: Vec<ClientAction>) {
        for action in actions {
            match action {
                ClientAction::PostMessage { message, .. } => self.post_to_host(worker, message),
                ClientAction::UnloadRequested => {
                    self.record_received(worker, ClientAction::UnloadRequested);
                    self.acknowledge_unload(worker);
                },
                received @ (ClientAction::EnvironmentChanged(_) | ClientAction::Deliver(_)) => {
                    self.record_received(worker, received);
                },
                ClientAction::AddMessageListener
                | ClientAction::RemoveMessageListener
                | ClientAction::AddInputListeners
                | ClientAction::RemoveInputListeners => {},
            }
        }
    }

    fn record_received(&mut self, worker: WorkerId, action: ClientAction) {
        if let Some(sim) = self.workers.get_mut(&worker) {
            sim.received.push(action);
        }
    }

    fn acknowledge_unload(&mut self, worker: WorkerId) {
        let Some(sim) = self.workers.get_mut(&worker) else {
            return;
        };
        if self.hanging.contains(&sim.script_url) {
            tracing::debug!(?worker, "worker ignores unload request");
            return;
        }
        match sim.client.acknowledge_unload() {
            Ok(actions) => self.execute_client_actions(worker, actions),
            Err(e) => self.client_errors.push(e),
        }
    }

    fn post_to_host(&mut self, worker: WorkerId, message: Value) {
        self.trace.record(TraceEntry::Post(Delivery {
            from: Endpoint::Worker(worker.0),
            to: Endpoint::Host,
            msg_type: Delivery::msg_type_of(&message),
            target_origin: None,
            recipient_origin: None,
            delivered: true,
        }));
        if let Err(e) = self.pool.handle_message(WorkerMessage { data: message, source: worker }) {
            self.host_errors.push(e);
        }
        self.events.extend(self.pool.take_events());
    }
}

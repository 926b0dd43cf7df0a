//! Worker clients owned by a host.
//!
//! [`WorkerPool`] runs one dedicated worker per registered worker client and
//! a [`HostCoordinator`] for each, so workers take part in the same handshake
//! and pub/sub as frame clients. Worker handles are allocated by the pool;
//! handles are never reused, so messages from a terminated instance can never
//! be mistaken for a live one.
//!
//! The configuration is fixed while the pool is running. Reconfiguring
//! requires a full [`WorkerPool::stop`] first.

use std::{collections::BTreeMap, ops::Sub, time::Duration};

use ifc_core::{ClientId, EnvironmentData, RoutingMap, Url, router::normalize_route};
use serde_json::Value;

use crate::{
    ClientBinding, HostCoordinator, HostError, HostEvent, WorkerAction, WorkerConfig, WorkerId,
    WorkerManager, WorkerMessage, frame_router::build_router,
};

/// Set of worker clients started and stopped together.
#[derive(Debug, Clone)]
pub struct WorkerPool<I> {
    environment: EnvironmentData,
    host_url: Option<Url>,
    config: WorkerConfig,
    clients: RoutingMap,
    workers: BTreeMap<ClientId, HostCoordinator<WorkerManager<I>>>,
    subscriptions: Vec<String>,
    next_worker: u64,
    events: Vec<HostEvent>,
}

impl<I> WorkerPool<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Empty pool.
    pub fn new(environment: EnvironmentData, host_url: Option<Url>, config: WorkerConfig) -> Self {
        Self {
            environment,
            host_url,
            config,
            clients: RoutingMap::new(),
            workers: BTreeMap::new(),
            subscriptions: Vec::new(),
            next_worker: 1,
            events: Vec::new(),
        }
    }

    /// Whether any worker is alive (running or unloading).
    pub fn is_running(&self) -> bool {
        self.workers.values().any(|w| w.transport().is_alive())
    }

    /// Registered worker clients.
    pub fn clients(&self) -> &RoutingMap {
        &self.clients
    }

    /// Worker coordinator for `client_id`, once started.
    pub fn worker(&self, client_id: &str) -> Option<&HostCoordinator<WorkerManager<I>>> {
        self.workers.get(client_id)
    }

    /// Replace the worker clients.
    ///
    /// # Errors
    ///
    /// - `HostError::PoolRunning` if any worker is alive
    /// - `HostError::Router` if a script URL cannot be resolved
    pub fn configure(&mut self, clients: RoutingMap) -> Result<(), HostError> {
        if self.is_running() {
            return Err(HostError::PoolRunning);
        }
        build_router(&clients, self.host_url.as_ref())?;

        self.workers.clear();
        self.clients = clients;
        Ok(())
    }

    /// Spawn a worker for every registered client.
    ///
    /// Idempotent for workers that are already alive.
    ///
    /// # Errors
    ///
    /// - `HostError::WorkerAlive` if a worker cannot be respawned
    pub fn start(&mut self) -> Result<(), HostError> {
        for (client_id, registration) in &self.clients {
            let coordinator = self.workers.entry(client_id.clone()).or_insert_with(|| {
                let manager = WorkerManager::new(
                    client_id.clone(),
                    registration.url.clone(),
                    self.host_url.clone(),
                    self.config,
                );
                let mut coordinator = HostCoordinator::new(manager, self.environment.clone());
                coordinator.bind_client(Some(ClientBinding::new(
                    client_id.clone(),
                    normalize_route(&registration.assigned_route),
                )));
                for topic in &self.subscriptions {
                    coordinator.subscribe(topic.clone());
                }
                coordinator
            });

            if coordinator.transport().is_alive() {
                continue;
            }
            let worker = WorkerId(self.next_worker);
            self.next_worker += 1;
            coordinator.transport_mut().spawn(worker)?;
        }

        tracing::info!(workers = self.workers.len(), "worker pool started");
        Ok(())
    }

    /// Ask every worker to unload. Workers that do not acknowledge within
    /// the unload timeout are terminated by [`WorkerPool::tick`].
    ///
    /// # Errors
    ///
    /// - `HostError::Protocol` if an unload request cannot be encoded
    pub fn stop(&mut self, now: I) -> Result<(), HostError> {
        for coordinator in self.workers.values_mut() {
            coordinator.transport_mut().request_unload(now)?;
        }
        tracing::info!("worker pool stopping");
        Ok(())
    }

    /// Advance time, terminating workers whose unload timed out.
    pub fn tick(&mut self, now: I) {
        for (client_id, coordinator) in &mut self.workers {
            if coordinator.transport_mut().tick(now) {
                self.events
                    .push(HostEvent::WorkerUnloaded { client_id: client_id.clone(), forced: true });
            }
        }
    }

    /// A worker posted a message.
    ///
    /// Messages from unknown or terminated handles are dropped.
    ///
    /// # Errors
    ///
    /// - `HostError::Protocol` if the worker sent an invalid message
    pub fn handle_message(&mut self, message: WorkerMessage) -> Result<(), HostError> {
        let Some(coordinator) =
            self.workers.values_mut().find(|c| c.transport().worker() == Some(message.source))
        else {
            tracing::debug!(source = ?message.source, "message from unknown worker dropped");
            return Ok(());
        };
        let result = coordinator.handle_inbound(message);
        self.events.extend(coordinator.take_events());
        result
    }

    /// Forward publications on `topic` from every worker.
    pub fn subscribe(&mut self, topic: impl Into<String>) {
        let topic = topic.into();
        for coordinator in self.workers.values_mut() {
            coordinator.subscribe(topic.clone());
        }
        if !self.subscriptions.contains(&topic) {
            self.subscriptions.push(topic);
        }
    }

    /// Stop forwarding publications on `topic`.
    pub fn unsubscribe(&mut self, topic: &str) {
        for coordinator in self.workers.values_mut() {
            coordinator.unsubscribe(topic);
        }
        self.subscriptions.retain(|t| t != topic);
    }

    /// Publish to one worker.
    ///
    /// # Errors
    ///
    /// - `HostError::UnknownClient` if `client_id` has no worker
    /// - `HostError::Protocol` if the payload cannot be encoded
    pub fn publish(
        &mut self,
        client_id: &str,
        topic: impl Into<String>,
        payload: Value,
    ) -> Result<bool, HostError> {
        let coordinator = self
            .workers
            .get_mut(client_id)
            .ok_or_else(|| HostError::UnknownClient(client_id.to_string()))?;
        coordinator.publish(topic, payload)
    }

    /// Drain pending host events.
    pub fn take_events(&mut self) -> Vec<HostEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drain pending platform actions of every worker.
    pub fn take_actions(&mut self) -> Vec<WorkerAction> {
        self.workers.values_mut().flat_map(HostCoordinator::take_actions).collect()
    }
}

#[cfg(test)]
mod tests {
    use ifc_core::ClientRegistration;
    use ifc_proto::{ClientToHost, Envelope};

    use super::*;

    type Pool = WorkerPool<Duration>;

    fn pool() -> Pool {
        let mut pool = Pool::new(EnvironmentData::default(), None, WorkerConfig::default());
        let clients: RoutingMap = [
            ("alpha".to_string(), ClientRegistration::new("https://w.example/alpha.js", "/alpha/")),
            ("beta".to_string(), ClientRegistration::new("https://w.example/beta.js", "beta")),
        ]
        .into();
        pool.configure(clients).unwrap();
        pool
    }

    fn from_worker(message: ClientToHost, source: WorkerId) -> WorkerMessage {
        WorkerMessage { data: Envelope::new(message).encode().unwrap(), source }
    }

    fn spawned(actions: &[WorkerAction]) -> Vec<WorkerId> {
        actions
            .iter()
            .filter_map(|a| match a {
                WorkerAction::Spawn { worker, .. } => Some(*worker),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn start_spawns_each_client_once() {
        let mut pool = pool();
        pool.start().unwrap();
        pool.start().unwrap();
        assert_eq!(spawned(&pool.take_actions()), vec![WorkerId(1), WorkerId(2)]);
        assert!(pool.is_running());
    }

    #[test]
    fn configure_rejected_while_running() {
        let mut pool = pool();
        pool.start().unwrap();
        assert_eq!(pool.configure(RoutingMap::new()), Err(HostError::PoolRunning));
    }

    #[test]
    fn worker_handshake_carries_normalized_route() {
        let mut pool = pool();
        pool.start().unwrap();
        pool.take_actions();

        pool.handle_message(from_worker(ClientToHost::ClientStarted, WorkerId(1))).unwrap();
        let actions = pool.take_actions();
        let [WorkerAction::PostMessage { worker, message }] = actions.as_slice() else {
            unreachable!("expected env_init, got {actions:?}");
        };
        assert_eq!(*worker, WorkerId(1));
        assert_eq!(message["msg"]["assignedRoute"], "alpha");
    }

    #[test]
    fn stop_with_mixed_acks() {
        let mut pool = pool();
        pool.start().unwrap();
        pool.take_actions();

        pool.stop(Duration::ZERO).unwrap();
        pool.handle_message(from_worker(ClientToHost::UnloadComplete, WorkerId(1))).unwrap();
        pool.tick(Duration::from_secs(3));

        assert_eq!(
            pool.take_events(),
            vec![
                HostEvent::WorkerUnloaded { client_id: "alpha".into(), forced: false },
                HostEvent::WorkerUnloaded { client_id: "beta".into(), forced: true },
            ]
        );
        assert!(!pool.is_running());
        assert!(pool.configure(RoutingMap::new()).is_ok());
    }

    #[test]
    fn tick_earlier_than_stop_keeps_waiting() {
        let mut pool = pool();
        pool.start().unwrap();
        pool.take_actions();

        pool.stop(Duration::from_secs(5)).unwrap();
        pool.take_actions();
        pool.tick(Duration::from_secs(4));

        assert!(pool.take_events().is_empty());
        assert!(pool.take_actions().is_empty());
        assert!(pool.is_running());
    }

    #[test]
    fn restart_uses_fresh_handles() {
        let mut pool = pool();
        pool.start().unwrap();
        pool.stop(Duration::ZERO).unwrap();
        pool.tick(Duration::from_secs(5));
        pool.take_actions();

        pool.start().unwrap();
        assert_eq!(spawned(&pool.take_actions()), vec![WorkerId(3), WorkerId(4)]);
        // The dead instance can no longer talk to the host.
        pool.handle_message(from_worker(ClientToHost::ClientStarted, WorkerId(1))).unwrap();
        assert!(pool.take_actions().is_empty());
    }

    #[test]
    fn publications_carry_worker_id() {
        let mut pool = pool();
        pool.subscribe("jobs");
        pool.start().unwrap();

        let publish = ClientToHost::Publish(ifc_proto::payloads::pubsub::Publication::new(
            "jobs",
            serde_json::json!(1),
        ));
        pool.handle_message(from_worker(publish, WorkerId(2))).unwrap();
        let events = pool.take_events();
        let [HostEvent::Publication { publication }] = events.as_slice() else {
            unreachable!("expected one publication, got {events:?}");
        };
        assert_eq!(publication.client_id.as_deref(), Some("beta"));
    }

    #[test]
    fn publish_to_unknown_worker_fails() {
        let mut pool = pool();
        assert_eq!(
            pool.publish("gamma", "t", Value::Null),
            Err(HostError::UnknownClient("gamma".into()))
        );
    }
}

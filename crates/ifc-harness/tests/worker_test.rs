//! End-to-end tests of worker clients.

use std::time::Duration;

use ifc_client::ClientAction;
use ifc_core::{ClientRegistration, EnvironmentData, RoutingMap};
use ifc_harness::{SimEnv, SimWorkers, invariants::InvariantRegistry};
use ifc_host::{HostEvent, WorkerConfig, WorkerId};
use serde_json::json;

const SYNC_SCRIPT: &str = "https://w.example/sync.js";

fn workers() -> SimWorkers {
    let clients: RoutingMap = [
        ("indexer".to_string(), ClientRegistration::new("https://w.example/indexer.js", "indexer")),
        ("sync".to_string(), ClientRegistration::new(SYNC_SCRIPT, "/sync/")),
    ]
    .into();
    let environment = EnvironmentData {
        locale: "de-DE".into(),
        host_root_url: "https://host.example/".into(),
        registered_keys: None,
        custom: Some(json!({"tenant": 7})),
    };
    SimWorkers::new(SimEnv::new(), environment, None, clients, WorkerConfig::default()).unwrap()
}

fn unloaded(events: &[HostEvent]) -> Vec<(&str, bool)> {
    events
        .iter()
        .filter_map(|e| match e {
            HostEvent::WorkerUnloaded { client_id, forced } => Some((client_id.as_str(), *forced)),
            _ => None,
        })
        .collect()
}

#[test]
fn workers_complete_the_handshake() {
    let mut sim = workers();
    sim.start().unwrap();

    let routes: Vec<_> = sim
        .workers()
        .values()
        .filter_map(|w| w.client.environment())
        .map(|env| env.assigned_route.as_str())
        .collect();
    assert_eq!(routes, vec!["indexer", "sync"]);

    let started = sim
        .take_events()
        .into_iter()
        .filter(|e| matches!(e, HostEvent::ClientStarted { .. }))
        .count();
    assert_eq!(started, 2);
    InvariantRegistry::standard().assert_all(sim.trace(), "after start");
}

#[test]
fn graceful_unload_terminates_every_worker() {
    let mut sim = workers();
    sim.start().unwrap();
    sim.take_events();

    sim.stop().unwrap();

    assert_eq!(unloaded(&sim.take_events()), vec![("indexer", false), ("sync", false)]);
    assert!(sim.workers().is_empty());
    assert!(!sim.pool().is_running());
    InvariantRegistry::standard().assert_all(sim.trace(), "after stop");
}

#[test]
fn hanging_worker_is_terminated_after_timeout() {
    let mut sim = workers();
    sim.hang_on_unload(SYNC_SCRIPT);
    sim.start().unwrap();
    sim.take_events();

    sim.stop().unwrap();
    assert_eq!(unloaded(&sim.take_events()), vec![("indexer", false)]);

    sim.advance(Duration::from_millis(2_999));
    assert!(unloaded(&sim.take_events()).is_empty());
    assert!(sim.pool().is_running());

    sim.advance(Duration::from_millis(1));
    assert_eq!(unloaded(&sim.take_events()), vec![("sync", true)]);
    assert!(sim.workers().is_empty());
    InvariantRegistry::standard().assert_all(sim.trace(), "after forced unload");
}

#[test]
fn worker_pubsub_in_both_directions() {
    let mut sim = workers();
    sim.pool_mut().subscribe("progress");
    sim.worker_subscribe("commands");
    sim.start().unwrap();
    sim.take_events();

    let indexer = sim.worker_of("indexer").unwrap();
    sim.with_worker(indexer, |c| c.publish("progress", json!(50))).unwrap();
    let events = sim.take_events();
    let [HostEvent::Publication { publication }] = events.as_slice() else {
        panic!("expected one publication, got {events:?}");
    };
    assert_eq!(publication.client_id.as_deref(), Some("indexer"));

    assert!(sim.host_publish("sync", "commands", json!("flush")).unwrap());
    let sync = sim.worker_of("sync").unwrap();
    let delivered = sim.workers()[&sync]
        .received
        .iter()
        .any(|a| matches!(a, ClientAction::Deliver(p) if p.topic == "commands"));
    assert!(delivered);
}

#[test]
fn restart_after_stop_uses_fresh_instances() {
    let mut sim = workers();
    sim.start().unwrap();
    sim.stop().unwrap();
    sim.take_events();

    sim.start().unwrap();
    let ids: Vec<_> = sim.workers().keys().copied().collect();
    assert_eq!(ids, vec![WorkerId(3), WorkerId(4)]);
    assert!(sim.take_client_errors().is_empty());
    assert!(sim.take_host_errors().is_empty());
    InvariantRegistry::standard().assert_all(sim.trace(), "after restart");
}

#[test]
fn pool_cannot_be_reconfigured_while_running() {
    let mut sim = workers();
    sim.start().unwrap();
    assert!(sim.pool_mut().configure(RoutingMap::new()).is_err());

    sim.stop().unwrap();
    assert!(sim.pool_mut().configure(RoutingMap::new()).is_ok());
}

#[test]
fn forced_unload_trace() {
    let clients: RoutingMap =
        [("sync".to_string(), ClientRegistration::new(SYNC_SCRIPT, "sync"))].into();
    let mut sim = SimWorkers::new(
        SimEnv::new(),
        EnvironmentData::default(),
        None,
        clients,
        WorkerConfig { unload_timeout_ms: 500 },
    )
    .unwrap();
    sim.hang_on_unload(SYNC_SCRIPT);

    sim.start().unwrap();
    sim.stop().unwrap();
    sim.advance(Duration::from_millis(500));

    insta::assert_json_snapshot!(sim.trace().entries(), @r#"
    [
      {
        "kind": "spawned",
        "worker": 1
      },
      {
        "kind": "post",
        "from": {
          "worker": 1
        },
        "to": "host",
        "msgType": "client_started",
        "delivered": true
      },
      {
        "kind": "post",
        "from": "host",
        "to": {
          "worker": 1
        },
        "msgType": "env_init",
        "delivered": true
      },
      {
        "kind": "post",
        "from": "host",
        "to": {
          "worker": 1
        },
        "msgType": "unload_request",
        "delivered": true
      },
      {
        "kind": "terminated",
        "worker": 1
      }
    ]
    "#);
}

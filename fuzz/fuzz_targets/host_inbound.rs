//! Fuzz target for the frame host's inbound path
//!
//! Drives a `FrameRouter` with arbitrary route changes, loads and message
//! events from arbitrary origins and windows.
//!
//! # Invariants
//!
//! - NEVER panic on untrusted data
//! - Every post targets the origin of the frame's current location
//! - Only messages from the frame's origin and window can raise errors

#![no_main]

use arbitrary::Arbitrary;
use ifc_core::{ClientRegistration, Lifecycle, RoutingMap};
use ifc_host::{FrameAction, FrameRouter, FrameRouterConfig, MessageEvent, WindowId};
use libfuzzer_sys::fuzz_target;
use serde_json::Value;

const ORIGINS: [&str; 3] = ["https://a.example", "https://b.example", "https://evil.example"];

#[derive(Debug, Arbitrary)]
enum Step {
    Route(u8),
    Load(u8),
    Message { origin: u8, window: Option<u8>, data: Vec<u8> },
    Publish,
    Detach,
    Attach,
}

fuzz_target!(|steps: Vec<Step>| {
    let clients: RoutingMap = [
        ("a".to_string(), ClientRegistration::new("https://a.example/#/", "a")),
        ("b".to_string(), ClientRegistration::new("https://b.example/app/", "b")),
    ]
    .into();
    let config = FrameRouterConfig { clients, ..FrameRouterConfig::default() };
    let Ok(mut host) = FrameRouter::new(config) else {
        return;
    };
    host.subscribe("t");
    host.on_attach();

    for step in steps {
        match step {
            Step::Route(n) => host.set_route(["a/x", "b", "c", ""][usize::from(n % 4)]),
            Step::Load(n) => host.handle_load(WindowId(u64::from(n % 3))),
            Step::Message { origin, window, data } => {
                let Ok(data) = serde_json::from_slice::<Value>(&data) else {
                    continue;
                };
                let origin = ORIGINS[usize::from(origin % 3)];
                let source = window.map(|w| WindowId(u64::from(w % 3)));
                let trusted = host.frame().expected_client_origin().is_some_and(|o| o.matches(origin))
                    && source.is_some()
                    && source == host.frame().content_window();
                let result = host.handle_message(MessageEvent { data, origin: origin.into(), source });
                assert!(trusted || result.is_ok(), "untrusted message raised {result:?}");
            },
            Step::Publish => {
                let _ = host.publish("t", Value::Null);
            },
            Step::Detach => host.on_detach(),
            Step::Attach => host.on_attach(),
        }

        let expected = host.frame().expected_client_origin();
        for action in host.take_actions() {
            if let FrameAction::PostMessage { target_origin, .. } = action {
                assert_eq!(Some(target_origin.as_str()), expected.as_ref().map(|o| o.as_str()));
            }
        }
        host.take_events();
    }
});

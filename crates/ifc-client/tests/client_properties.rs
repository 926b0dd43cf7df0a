//! Property-based tests for the client lifecycle.
//!
//! Listener registration must stay balanced under any sequence of starts and
//! stops, and the host must hear exactly one `client_started` per actual
//! start.

use ifc_client::{Client, ClientAction, ClientConfig, ClientEvent, ClientState};
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
enum Op {
    Start,
    Stop,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![Just(Op::Start), Just(Op::Stop)]
}

fn config_strategy() -> impl Strategy<Value = ClientConfig> {
    prop_oneof![
        Just(ClientConfig::default()),
        Just(ClientConfig::frame("https://host.example")),
        Just(ClientConfig::worker()),
    ]
}

proptest! {
    #[test]
    fn prop_listeners_stay_balanced(
        config in config_strategy(),
        ops in prop::collection::vec(op_strategy(), 0..30),
    ) {
        let mut client = Client::new(config);
        let mut listeners: i32 = 0;
        let mut announcements = 0usize;
        let mut starts = 0usize;

        for op in ops {
            let was_started = client.is_started();
            let event = match op {
                Op::Start => ClientEvent::Start,
                Op::Stop => ClientEvent::Stop,
            };
            if matches!(op, Op::Start) && !was_started {
                starts += 1;
            }

            for action in client.handle(event).expect("lifecycle events never fail") {
                match action {
                    ClientAction::AddMessageListener => listeners += 1,
                    ClientAction::RemoveMessageListener => listeners -= 1,
                    ClientAction::PostMessage { message, .. } => {
                        prop_assert_eq!(message["msgType"].as_str(), Some("client_started"));
                        announcements += 1;
                    },
                    _ => {},
                }
            }

            // PROPERTY: exactly one listener while started, none otherwise
            prop_assert_eq!(listeners, i32::from(client.is_started()));
        }

        prop_assert_eq!(announcements, starts);
    }

    #[test]
    fn prop_nothing_is_posted_while_stopped(topic in "[a-z]{1,8}", stop_first in any::<bool>()) {
        let mut client = Client::new(ClientConfig::frame("https://host.example"));
        if stop_first {
            client.handle(ClientEvent::Start).expect("start");
            client.handle(ClientEvent::Stop).expect("stop");
            prop_assert_eq!(client.state(), ClientState::Stopped);
        }

        let actions = client.publish(topic, serde_json::Value::Null).expect("publish");
        prop_assert!(actions.is_empty());
    }
}

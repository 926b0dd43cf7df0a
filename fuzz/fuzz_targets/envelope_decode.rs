//! Fuzz target for `validate_incoming`
//!
//! Feeds arbitrary JSON, as any window could `postMessage` it, through the
//! validators of both roles.
//!
//! # Invariants
//!
//! - NEVER panic on untrusted data
//! - An accepted envelope re-encodes to a value that is accepted again with
//!   the same message

#![no_main]

use ifc_proto::{ClientToHost, Envelope, HostToClient, Inbound, Message, validate_incoming};
use libfuzzer_sys::fuzz_target;
use serde_json::Value;

fn check<M: Message + PartialEq + std::fmt::Debug>(raw: &Value) {
    let Ok(Inbound::Accepted(envelope)) = validate_incoming::<M>(raw) else {
        return;
    };
    let encoded = Envelope::new(envelope.message).encode().expect("accepted message must encode");
    match validate_incoming::<M>(&encoded) {
        Ok(Inbound::Accepted(again)) => {
            let original = validate_incoming::<M>(raw).ok().and_then(Inbound::accepted);
            assert_eq!(original.map(|e| e.message), Some(again.message));
        },
        other => panic!("re-encoded message rejected: {other:?}"),
    }
}

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = serde_json::from_slice::<Value>(data) else {
        return;
    };
    check::<ClientToHost>(&raw);
    check::<HostToClient>(&raw);
});

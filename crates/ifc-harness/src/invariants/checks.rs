//! Standard invariant checks.

use std::collections::BTreeSet;

use super::{Invariant, InvariantResult, Violation};
use crate::{Endpoint, Trace, TraceEntry};

/// Host posts to a frame always name the frame document's origin.
///
/// The host must never use a wildcard target, and must never post while the
/// frame shows a document whose origin it cannot name.
pub struct PostsTargetRecipientOrigin;

impl Invariant for PostsTargetRecipientOrigin {
    fn name(&self) -> &'static str {
        "posts_target_recipient_origin"
    }

    fn check(&self, trace: &Trace) -> InvariantResult {
        for post in trace.posts() {
            if post.from != Endpoint::Host || !matches!(post.to, Endpoint::Frame(_)) {
                continue;
            }
            let target = post.target_origin.as_deref();
            if target.is_none() || target != post.recipient_origin.as_deref() {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "{} posted with target {target:?} to a document at {:?}",
                        post.msg_type, post.recipient_origin
                    ),
                });
            }
        }
        Ok(())
    }
}

/// `env_init` reaches an endpoint only after that endpoint's
/// `client_started` reached the host.
pub struct HandshakeOrder;

impl Invariant for HandshakeOrder {
    fn name(&self) -> &'static str {
        "handshake_order"
    }

    fn check(&self, trace: &Trace) -> InvariantResult {
        let mut announced: Vec<&Endpoint> = Vec::new();
        for post in trace.posts().filter(|p| p.delivered) {
            if post.to == Endpoint::Host && post.msg_type == "client_started" {
                announced.push(&post.from);
            }
            if post.from == Endpoint::Host
                && post.msg_type == "env_init"
                && !announced.contains(&&post.to)
            {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("env_init delivered to {} before it announced itself", post.to),
                });
            }
        }
        Ok(())
    }
}

/// No message is addressed to a worker that was never spawned or has been
/// terminated.
pub struct NoPostsToDeadWorkers;

impl Invariant for NoPostsToDeadWorkers {
    fn name(&self) -> &'static str {
        "no_posts_to_dead_workers"
    }

    fn check(&self, trace: &Trace) -> InvariantResult {
        let mut alive = BTreeSet::new();
        for entry in trace.entries() {
            match entry {
                TraceEntry::Spawned { worker } => {
                    alive.insert(*worker);
                },
                TraceEntry::Terminated { worker } => {
                    alive.remove(worker);
                },
                TraceEntry::Post(post) => {
                    if let (Endpoint::Host, Endpoint::Worker(worker)) = (&post.from, &post.to) {
                        if !alive.contains(worker) {
                            return Err(Violation {
                                invariant: self.name(),
                                message: format!("{} posted to dead worker#{worker}", post.msg_type),
                            });
                        }
                    }
                },
                TraceEntry::Navigated { .. } => {},
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Delivery;

    fn post(from: Endpoint, to: Endpoint, msg_type: &str, target: Option<&str>) -> TraceEntry {
        TraceEntry::Post(Delivery {
            from,
            to,
            msg_type: msg_type.into(),
            target_origin: target.map(str::to_string),
            recipient_origin: Some("https://a.example".into()),
            delivered: true,
        })
    }

    fn trace(entries: Vec<TraceEntry>) -> Trace {
        let mut trace = Trace::new();
        for entry in entries {
            trace.record(entry);
        }
        trace
    }

    #[test]
    fn wildcard_host_post_is_a_violation() {
        let t = trace(vec![post(Endpoint::Host, Endpoint::Frame(1), "publish", Some("*"))]);
        assert!(PostsTargetRecipientOrigin.check(&t).is_err());

        let t = trace(vec![post(Endpoint::Host, Endpoint::Frame(1), "publish", Some("https://a.example"))]);
        assert!(PostsTargetRecipientOrigin.check(&t).is_ok());
    }

    #[test]
    fn env_init_must_follow_announcement_from_same_document() {
        let t = trace(vec![
            post(Endpoint::Frame(1), Endpoint::Host, "client_started", Some("*")),
            post(Endpoint::Host, Endpoint::Frame(2), "env_init", Some("https://a.example")),
        ]);
        assert!(HandshakeOrder.check(&t).is_err());

        let t = trace(vec![
            post(Endpoint::Frame(2), Endpoint::Host, "client_started", Some("*")),
            post(Endpoint::Host, Endpoint::Frame(2), "env_init", Some("https://a.example")),
        ]);
        assert!(HandshakeOrder.check(&t).is_ok());
    }

    #[test]
    fn posts_after_termination_are_violations() {
        let t = trace(vec![
            TraceEntry::Spawned { worker: 1 },
            post(Endpoint::Host, Endpoint::Worker(1), "unload_request", None),
            TraceEntry::Terminated { worker: 1 },
            post(Endpoint::Host, Endpoint::Worker(1), "publish", None),
        ]);
        let violation = NoPostsToDeadWorkers.check(&t).unwrap_err();
        assert!(violation.message.contains("worker#1"));
    }
}

//! Observable record of a simulation run.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// A window or worker taking part in the simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Endpoint {
    /// The host window.
    Host,
    /// A document loaded into the host's frame. Each navigation creates a
    /// new document.
    Frame(u64),
    /// A dedicated worker instance.
    Worker(u64),
    /// A window outside the bus (another tab, a third-party frame).
    Foreign(String),
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => f.write_str("host"),
            Self::Frame(document) => write!(f, "frame#{document}"),
            Self::Worker(worker) => write!(f, "worker#{worker}"),
            Self::Foreign(origin) => write!(f, "foreign({origin})"),
        }
    }
}

/// One `postMessage` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    /// Sender.
    pub from: Endpoint,
    /// Intended recipient.
    pub to: Endpoint,
    /// `msgType` of the posted value, empty for untagged data.
    pub msg_type: String,
    /// Target origin passed to `postMessage`. `None` for workers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_origin: Option<String>,
    /// Origin of the recipient document when the message was posted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_origin: Option<String>,
    /// Whether the browser handed the message to a listener.
    pub delivered: bool,
}

impl Delivery {
    /// `msgType` of an encoded value.
    pub fn msg_type_of(message: &Value) -> String {
        message.get("msgType").and_then(Value::as_str).unwrap_or_default().to_string()
    }
}

/// Trace entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum TraceEntry {
    /// A message was posted.
    Post(Delivery),
    /// The frame loaded a new document.
    Navigated {
        /// New document.
        document: u64,
        /// Location it was loaded from.
        location: String,
    },
    /// A worker instance was created.
    Spawned {
        /// Worker handle.
        worker: u64,
    },
    /// A worker instance was terminated.
    Terminated {
        /// Worker handle.
        worker: u64,
    },
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Post(d) => {
                write!(f, "{} -> {} {}", d.from, d.to, d.msg_type)?;
                if let Some(target) = &d.target_origin {
                    write!(f, " [{target}]")?;
                }
                if !d.delivered {
                    f.write_str(" (dropped)")?;
                }
                Ok(())
            },
            Self::Navigated { document, location } => write!(f, "frame#{document} loaded {location}"),
            Self::Spawned { worker } => write!(f, "worker#{worker} spawned"),
            Self::Terminated { worker } => write!(f, "worker#{worker} terminated"),
        }
    }
}

/// Ordered record of everything observable across window boundaries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Trace {
    entries: Vec<TraceEntry>,
}

impl Trace {
    /// Empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn record(&mut self, entry: TraceEntry) {
        tracing::trace!(%entry, "sim");
        self.entries.push(entry);
    }

    /// All entries in order.
    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    /// Posts only.
    pub fn posts(&self) -> impl Iterator<Item = &Delivery> {
        self.entries.iter().filter_map(|e| match e {
            TraceEntry::Post(d) => Some(d),
            _ => None,
        })
    }

    /// Delivered posts sent from `from` to `to`.
    pub fn delivered(&self, from: &Endpoint, to: &Endpoint) -> Vec<&Delivery> {
        self.posts().filter(|d| d.delivered && d.from == *from && d.to == *to).collect()
    }

    /// One line per entry, for snapshots and failure output.
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }

    /// Forget everything recorded so far.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_render_posts_and_lifecycle() {
        let mut trace = Trace::new();
        trace.record(TraceEntry::Navigated { document: 1, location: "https://a.example/".into() });
        trace.record(TraceEntry::Post(Delivery {
            from: Endpoint::Host,
            to: Endpoint::Frame(1),
            msg_type: "env_init".into(),
            target_origin: Some("https://a.example".into()),
            recipient_origin: Some("https://a.example".into()),
            delivered: false,
        }));
        trace.record(TraceEntry::Terminated { worker: 3 });

        assert_eq!(
            trace.lines(),
            vec![
                "frame#1 loaded https://a.example/",
                "host -> frame#1 env_init [https://a.example] (dropped)",
                "worker#3 terminated",
            ]
        );
    }

    #[test]
    fn untagged_values_have_empty_type() {
        assert_eq!(Delivery::msg_type_of(&serde_json::json!({"hello": 1})), "");
    }
}

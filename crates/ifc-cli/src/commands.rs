//! Subcommands.
//!
//! Each command returns the lines to print. Nothing here writes to stdout, so
//! commands can be tested directly.

use std::{collections::BTreeMap, path::Path};

use ifc_core::{Origin, SystemEnv, router::normalize_route};
use ifc_proto::{ClientToHost, Direction, HostToClient, Inbound, Message, validate_incoming};
use serde_json::Value;

use crate::{CliError, HostConfig};

/// Which client owns each route, and where its frame would point.
///
/// # Errors
///
/// - `CliError::Config` if the configuration cannot be turned into a router
pub fn resolve(config: &HostConfig, routes: &[String]) -> Result<Vec<String>, CliError> {
    let router = config.router()?;
    let lines = routes
        .iter()
        .map(|route| match router.get_client_target(route) {
            Some(target) => format!(
                "{route} -> {} {} (assigned route {:?})",
                target.id, target.url, target.assigned_route
            ),
            None => format!("{route} -> no client"),
        })
        .collect();
    Ok(lines)
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// One line per checked message.
    pub lines: Vec<String>,
    /// Messages that are tagged with the protocol but invalid.
    pub violations: usize,
}

impl ValidationReport {
    /// `Err` if any message violates the protocol.
    ///
    /// # Errors
    ///
    /// - `CliError::InvalidMessages` with the violation count
    pub fn into_result(self) -> Result<Vec<String>, CliError> {
        if self.violations == 0 {
            Ok(self.lines)
        } else {
            Err(CliError::InvalidMessages { count: self.violations, total: self.lines.len() })
        }
    }
}

/// Classify captured messages as a receiver reading `direction` would.
///
/// The file holds one message or an array of messages.
///
/// # Errors
///
/// - `CliError::Io` / `CliError::Json` if the file cannot be read as JSON
pub fn validate(path: &Path, direction: Direction) -> Result<ValidationReport, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| CliError::Io { path: path.to_path_buf(), source })?;
    let value: Value = serde_json::from_str(&text)
        .map_err(|source| CliError::Json { path: path.to_path_buf(), source })?;
    Ok(validate_values(&value, direction))
}

/// [`validate`] on an already parsed value.
pub fn validate_values(value: &Value, direction: Direction) -> ValidationReport {
    let messages = match value {
        Value::Array(messages) => messages.as_slice(),
        single => std::slice::from_ref(single),
    };

    let mut violations = 0;
    let lines = messages
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            let outcome = match direction {
                Direction::ClientToHost => classify::<ClientToHost>(raw),
                Direction::HostToClient => classify::<HostToClient>(raw),
            };
            let outcome = outcome.unwrap_or_else(|reason| {
                violations += 1;
                format!("invalid: {reason}")
            });
            format!("#{index}: {outcome}")
        })
        .collect();

    ValidationReport { lines, violations }
}

fn classify<M: Message>(raw: &Value) -> Result<String, String> {
    match validate_incoming::<M>(raw) {
        Ok(Inbound::Accepted(envelope)) => {
            Ok(format!("accepted {} (version {})", envelope.msg_type(), envelope.version))
        },
        Ok(Inbound::Foreign) => Ok("foreign, ignored".to_string()),
        Ok(Inbound::Misdirected) => Ok("addressed to the other role, ignored".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

/// Load every part of the configuration and report what a host would do
/// with it, with warnings for registrations that cannot work as intended.
///
/// # Errors
///
/// - `CliError::Config` if the host, a client or a worker URL is invalid
pub fn check(config: &HostConfig) -> Result<Vec<String>, CliError> {
    let host_url = config.host_url()?;
    config.frame_router()?;
    let pool = config.worker_pool::<SystemEnv>()?;

    let mut lines = vec![format!("frame clients: {}", config.clients.len())];
    let mut owners: BTreeMap<&str, &str> = BTreeMap::new();
    let mut warnings = Vec::new();

    for (id, registration) in &config.clients {
        let route = normalize_route(&registration.assigned_route);
        let origin = Origin::of(&registration.url, host_url.as_ref());
        lines.push(format!(
            "  {id}: route {route:?}, origin {}",
            origin.as_ref().map_or("none", Origin::as_str)
        ));

        if origin.is_none() {
            warnings.push(format!("client {id} has no origin and can never reach the host"));
        }
        // Ids iterate in ascending order, so the first owner wins ties.
        match owners.get(route) {
            Some(owner) => {
                warnings.push(format!("client {id} shares route {route:?} with {owner}; {owner} wins"));
            },
            None => {
                owners.insert(route, id.as_str());
            },
        }
        if route.is_empty() {
            warnings.push(format!("client {id} owns every route no other client matches"));
        }
    }

    lines.push(format!(
        "worker clients: {} (unload timeout {}ms)",
        pool.clients().len(),
        config.worker_config.unload_timeout_ms
    ));
    for (id, registration) in pool.clients() {
        lines.push(format!("  {id}: {}", registration.url));
    }

    tracing::info!(
        clients = config.clients.len(),
        workers = pool.clients().len(),
        warnings = warnings.len(),
        "configuration checked"
    );
    lines.extend(warnings.into_iter().map(|w| format!("warning: {w}")));
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use ifc_core::ClientRegistration;
    use ifc_proto::Envelope;
    use serde_json::json;

    use super::*;

    fn config() -> HostConfig {
        HostConfig {
            clients: [
                ("orders".to_string(), ClientRegistration::new("https://orders.example/#/", "/orders/")),
                ("reports".to_string(), ClientRegistration::new("https://reports.example/app/", "reports")),
            ]
            .into(),
            ..HostConfig::default()
        }
    }

    #[test]
    fn resolve_reports_owner_and_target() {
        let lines =
            resolve(&config(), &["orders/42".to_string(), "reports/q3".to_string(), "x".to_string()])
                .unwrap();
        assert_eq!(
            lines,
            vec![
                r#"orders/42 -> orders https://orders.example/#/42 (assigned route "orders")"#,
                r#"reports/q3 -> reports https://reports.example/app/q3 (assigned route "reports")"#,
                "x -> no client",
            ]
        );
    }

    #[test]
    fn validate_classifies_each_message() {
        let started = Envelope::new(ClientToHost::ClientStarted).encode().unwrap();
        let messages = json!([
            started,
            {"type": "webpackOk"},
            {"protocol": "iframe-coordinator", "msgType": "teleport", "msg": {}},
        ]);

        let report = validate_values(&messages, Direction::ClientToHost);
        assert_eq!(report.violations, 1);
        assert!(report.lines[0].starts_with("#0: accepted client_started"));
        assert_eq!(report.lines[1], "#1: foreign, ignored");
        assert!(report.lines[2].starts_with("#2: invalid:"));
        assert!(matches!(
            report.into_result(),
            Err(CliError::InvalidMessages { count: 1, total: 3 })
        ));
    }

    #[test]
    fn validate_flags_misdirected_messages_without_failing() {
        let started = Envelope::new(ClientToHost::ClientStarted).encode().unwrap();
        let report = validate_values(&started, Direction::HostToClient);
        assert_eq!(report.lines, vec!["#0: addressed to the other role, ignored"]);
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn check_warns_about_shared_and_catch_all_routes() {
        let mut config = config();
        config
            .clients
            .insert("archive".to_string(), ClientRegistration::new("https://archive.example/", "orders"));
        config.clients.insert("fallback".to_string(), ClientRegistration::new("data:text/html,hi", ""));

        let lines = check(&config).unwrap();
        assert_eq!(lines[0], "frame clients: 4");
        for warning in [
            r#"warning: client orders shares route "orders" with archive; archive wins"#,
            "warning: client fallback has no origin and can never reach the host",
            "warning: client fallback owns every route no other client matches",
        ] {
            assert!(lines.iter().any(|l| l == warning), "missing {warning:?} in {lines:?}");
        }
    }

    #[test]
    fn check_lists_workers() {
        let mut config = config();
        config.workers.insert("indexer".to_string(), ClientRegistration::new("https://w.example/i.js", "i"));

        let lines = check(&config).unwrap();
        assert!(lines.contains(&"worker clients: 1 (unload timeout 3000ms)".to_string()));
        assert!(lines.contains(&"  indexer: https://w.example/i.js".to_string()));
    }
}

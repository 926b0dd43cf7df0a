//! Host configuration file.
//!
//! ```json
//! {
//!   "hostUrl": "https://host.example/app/",
//!   "clients": {
//!     "orders": { "url": "https://orders.example/#/", "assignedRoute": "orders" }
//!   },
//!   "environment": { "locale": "en-US", "hostRootUrl": "https://host.example/#/" },
//!   "workers": {
//!     "indexer": { "url": "workers/indexer.js", "assignedRoute": "indexer" }
//!   },
//!   "workerConfig": { "unloadTimeoutMs": 3000 }
//! }
//! ```

use std::path::Path;

use ifc_core::{ClientRouter, Environment, EnvironmentData, RoutingMap, Url, router::parse_host_url};
use ifc_host::{FrameRouter, FrameRouterConfig, HostError, WorkerConfig, WorkerPool};
use serde::{Deserialize, Serialize};

use crate::CliError;

/// Everything a host needs to embed its clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostConfig {
    /// Host page URL; relative client and worker URLs resolve against it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_url: Option<String>,

    /// Frame clients.
    pub clients: RoutingMap,

    /// Environment shared with every client.
    pub environment: EnvironmentData,

    /// Worker clients.
    #[serde(skip_serializing_if = "RoutingMap::is_empty")]
    pub workers: RoutingMap,

    /// Worker lifecycle settings.
    pub worker_config: WorkerConfig,
}

impl HostConfig {
    /// Read and parse a configuration file.
    ///
    /// # Errors
    ///
    /// - `CliError::Io` if the file cannot be read
    /// - `CliError::Json` if it is not a valid configuration
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| CliError::Io { path: path.to_path_buf(), source })?;
        let config = serde_json::from_str(&text)
            .map_err(|source| CliError::Json { path: path.to_path_buf(), source })?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Parsed host page URL.
    ///
    /// # Errors
    ///
    /// - `CliError::Config` if the URL is not absolute
    pub fn host_url(&self) -> Result<Option<Url>, CliError> {
        let url = self.host_url.as_deref().map(parse_host_url).transpose().map_err(HostError::from)?;
        Ok(url)
    }

    /// Route resolver over the frame clients.
    ///
    /// # Errors
    ///
    /// - `CliError::Config` if the host URL or a client URL is invalid
    pub fn router(&self) -> Result<ClientRouter, CliError> {
        let router = match self.host_url()? {
            Some(host_url) => ClientRouter::with_host_url(&self.clients, &host_url),
            None => ClientRouter::new(&self.clients),
        };
        Ok(router.map_err(HostError::from)?)
    }

    /// Host element for the frame clients.
    ///
    /// # Errors
    ///
    /// - `CliError::Config` if the host URL or a client URL is invalid
    pub fn frame_router(&self) -> Result<FrameRouter, CliError> {
        Ok(FrameRouter::new(FrameRouterConfig {
            clients: self.clients.clone(),
            environment: self.environment.clone(),
            host_url: self.host_url()?,
        })?)
    }

    /// Configured worker pool on the clock of `E`, not started.
    ///
    /// # Errors
    ///
    /// - `CliError::Config` if the host URL or a worker URL is invalid
    pub fn worker_pool<E: Environment>(&self) -> Result<WorkerPool<E::Instant>, CliError> {
        let mut pool = WorkerPool::new(self.environment.clone(), self.host_url()?, self.worker_config);
        pool.configure(self.workers.clone())?;
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ifc_core::SystemEnv;

    use super::*;

    const EXAMPLE: &str = r#"{
        "hostUrl": "https://host.example/app/",
        "clients": {
            "orders": {"url": "https://orders.example/#/", "assignedRoute": "orders"},
            "local": {"url": "local/index.html", "assignedRoute": "/local/"}
        },
        "environment": {"locale": "en-US", "hostRootUrl": "https://host.example/#/"},
        "workers": {
            "indexer": {"url": "workers/indexer.js", "assignedRoute": "indexer"}
        },
        "workerConfig": {"unloadTimeoutMs": 500}
    }"#;

    #[test]
    fn parses_full_configuration() {
        let config: HostConfig = serde_json::from_str(EXAMPLE).unwrap();
        assert_eq!(config.clients.len(), 2);
        assert_eq!(config.workers.len(), 1);
        assert_eq!(config.worker_config.unload_timeout(), Duration::from_millis(500));
        assert_eq!(config.environment.locale, "en-US");
    }

    #[test]
    fn relative_urls_resolve_against_host_url() {
        let config: HostConfig = serde_json::from_str(EXAMPLE).unwrap();
        let target = config.router().unwrap().get_client_target("local/a").unwrap();
        assert_eq!(target.url, "https://host.example/app/local/index.html/a");
        assert!(config.worker_pool::<SystemEnv>().is_ok());
    }

    #[test]
    fn worker_pool_runs_on_the_system_clock() {
        let config: HostConfig = serde_json::from_str(EXAMPLE).unwrap();
        let env = SystemEnv;
        let mut pool = config.worker_pool::<SystemEnv>().unwrap();
        pool.start().unwrap();

        pool.stop(env.now()).unwrap();
        pool.tick(env.now());
        assert!(pool.is_running());
        assert!(pool.take_events().is_empty());
    }

    #[test]
    fn relative_urls_without_host_url_are_rejected() {
        let mut config: HostConfig = serde_json::from_str(EXAMPLE).unwrap();
        config.host_url = None;
        assert!(matches!(config.router(), Err(CliError::Config(HostError::Router(_)))));
        assert!(matches!(config.frame_router(), Err(CliError::Config(_))));
    }

    #[test]
    fn empty_object_is_a_valid_configuration() {
        let config: HostConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, HostConfig::default());
        assert!(config.router().unwrap().is_empty());
    }
}

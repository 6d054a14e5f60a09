//! Configuration loading
//!
//! Built on Figment. Defaults are layered under any `config.toml` found in
//! the working directory, the user's XDG config directory, or
//! `/etc/waypost/<service>/`, and `WAYPOST_`-prefixed environment variables
//! win over everything.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::alert::AlertConfig;
use crate::error::Result;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service configuration
    pub service: ServiceConfig,

    /// Redis configuration (optional; the in-memory store is used without it)
    #[serde(default)]
    pub redis: Option<RedisConfig>,

    /// Delivery-failure alerting configuration
    #[serde(default)]
    pub alert: AlertConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name
    pub name: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Environment (dev, staging, production)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Deployment identifier namespacing persisted state
    ///
    /// Two deployments sharing one Redis must configure distinct ids so
    /// their failure counters never collide. Leave unset for single-deployment
    /// installations.
    #[serde(default)]
    pub deployment_id: Option<String>,
}

/// Redis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL (redis://host:port or cluster URLs)
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_redis_max_connections")]
    pub max_connections: usize,

    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,

    /// Maximum retry attempts for establishing Redis connection
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay between retry attempts in seconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
}

impl Config {
    /// Load the configuration for the default service name
    pub fn load() -> Result<Self> {
        Self::load_for_service("waypost-alert")
    }

    /// Load the configuration for a named service
    ///
    /// Every existing candidate file (see [`Config::config_paths`]) is
    /// merged, nearest-wins, and `WAYPOST_`-prefixed environment variables
    /// override the result.
    pub fn load_for_service(service_name: &str) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        // Farthest file first so the nearer ones override it
        for path in Self::config_paths(service_name).into_iter().rev() {
            if path.exists() {
                tracing::info!(path = %path.display(), "Merging configuration file");
                figment = figment.merge(Toml::file(path));
            }
        }

        Ok(figment
            .merge(Env::prefixed("WAYPOST_").split("_"))
            .extract()?)
    }

    /// Load from one explicit file, skipping the search paths
    ///
    /// For tests and container deployments with a mounted config file.
    /// Environment variables still apply.
    pub fn load_from(path: &str) -> Result<Self> {
        Ok(Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("WAYPOST_").split("_"))
            .extract()?)
    }

    /// Candidate config files, nearest first
    ///
    /// The working directory, then `~/.config/waypost/<service>/`, then
    /// `/etc/waypost/<service>/`.
    fn config_paths(service_name: &str) -> Vec<PathBuf> {
        let per_service = Path::new(service_name).join("config.toml");

        let mut paths = vec![PathBuf::from("config.toml")];
        if let Ok(user) =
            xdg::BaseDirectories::with_prefix("waypost").place_config_file(&per_service)
        {
            paths.push(user);
        }
        paths.push(Path::new("/etc/waypost").join(&per_service));
        paths
    }

    /// Get Redis URL
    pub fn redis_url(&self) -> Option<&str> {
        self.redis.as_ref().map(|r| r.url.as_str())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                name: "waypost-alert".to_string(),
                log_level: default_log_level(),
                environment: default_environment(),
                deployment_id: None,
            },
            redis: None,
            alert: AlertConfig::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_environment() -> String {
    "dev".to_string()
}

fn default_redis_max_connections() -> usize {
    20
}

fn default_connection_timeout() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_delay() -> u64 {
    2
}

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use super::cache::CacheConfig;
use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::relay::RelayConfig;
use super::server::ServerConfig;
use super::upstream::UpstreamConfig;
use crate::dns_protocol::DnsProtocol;

const LOCAL_CONFIG_PATH: &str = "relay-dns.toml";
const SYSTEM_CONFIG_PATH: &str = "/etc/relay-dns/config.toml";

/// Main configuration structure for the relay
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub relay: RelayConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. relay-dns.toml in current directory
    /// 3. /etc/relay-dns/config.toml
    /// 4. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if let Some(path) = Self::get_config_path() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(bind) = overrides.bind_address {
            self.server.bind_address = bind;
        }
        if !overrides.upstreams.is_empty() {
            self.upstream.servers = overrides.upstreams;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    /// Parsed upstream endpoints, in configured order.
    pub fn upstream_endpoints(&self) -> Result<Vec<DnsProtocol>, ConfigError> {
        self.upstream
            .servers
            .iter()
            .map(|s| s.parse::<DnsProtocol>().map_err(ConfigError::Validation))
            .collect()
    }

    /// Listener address from `server.bind_address` and `server.port`.
    pub fn bind_socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = self.server.bind_address.parse::<IpAddr>().map_err(|e| {
            ConfigError::Validation(format!(
                "Invalid bind address '{}': {}",
                self.server.bind_address, e
            ))
        })?;
        Ok(SocketAddr::new(ip, self.server.port))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("DNS port cannot be 0".to_string()));
        }
        self.bind_socket_addr()?;

        if self.upstream.servers.is_empty() {
            return Err(ConfigError::Validation(
                "No upstream servers configured".to_string(),
            ));
        }
        self.upstream_endpoints()?;

        if self.upstream.attempt_timeout_ms == 0 || self.upstream.total_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "Upstream timeouts must be greater than 0".to_string(),
            ));
        }
        if self.upstream.attempt_timeout_ms > self.upstream.total_timeout_ms {
            return Err(ConfigError::Validation(format!(
                "attempt_timeout_ms ({}) exceeds total_timeout_ms ({})",
                self.upstream.attempt_timeout_ms, self.upstream.total_timeout_ms
            )));
        }

        if self.cache.min_ttl > self.cache.max_ttl {
            return Err(ConfigError::Validation(format!(
                "cache min_ttl ({}) exceeds max_ttl ({})",
                self.cache.min_ttl, self.cache.max_ttl
            )));
        }

        Ok(())
    }

    /// Get the path to the configuration file being used
    pub fn get_config_path() -> Option<String> {
        [LOCAL_CONFIG_PATH, SYSTEM_CONFIG_PATH]
            .into_iter()
            .find(|p| Path::new(p).exists())
            .map(str::to_string)
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    /// Replaces the configured list when non-empty.
    pub upstreams: Vec<String>,
    pub log_level: Option<String>,
}

//! Configuration for the gateway binary.
//!
//! Settings come from a YAML file, then a handful of environment variables
//! override individual values:
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `APP_CONFIG_PATH` | config file location (default `configs/config.yml`) |
//! | `APP_SERVER_HOST` | `server.host` |
//! | `APP_SERVER_PORT` | `server.port` |
//! | `GREEN_API_BASE_URL` | `green_api.base_url` |
//!
//! # Example
//!
//! ```yaml
//! server:
//!   host: 0.0.0.0
//!   port: 8080
//! green_api:
//!   base_url: https://api.green-api.com
//! ```

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::gateway::client::validate_base_url;
use crate::gateway::error::GatewayError;

pub const DEFAULT_CONFIG_PATH: &str = "configs/config.yml";

pub const ENV_CONFIG_PATH: &str = "APP_CONFIG_PATH";
pub const ENV_SERVER_HOST: &str = "APP_SERVER_HOST";
pub const ENV_SERVER_PORT: &str = "APP_SERVER_PORT";
pub const ENV_GREEN_API_BASE_URL: &str = "GREEN_API_BASE_URL";

/// Full gateway configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub green_api: GreenApiConfig,
}

/// Listener settings. Both fields are required; a missing `server:` section
/// fails validation the same way as a missing key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub host: String,
    /// Kept signed so an out-of-range value survives parsing and is reported
    /// by validation instead of by the YAML decoder.
    #[serde(default)]
    pub port: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GreenApiConfig {
    #[serde(default)]
    pub base_url: String,
}

impl GatewayConfig {
    /// Load from `path`, falling back to `APP_CONFIG_PATH` and then
    /// [`DEFAULT_CONFIG_PATH`], and apply the process environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, GatewayError> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    /// Same as [`load`](Self::load) with an explicit environment lookup.
    pub fn load_with_env<F>(path: Option<&Path>, env: F) -> Result<Self, GatewayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let resolved = resolve_path(path, &env);
        let raw = match std::fs::read_to_string(&resolved) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(GatewayError::Config(format!(
                    "config file {:?} not found",
                    resolved.display().to_string()
                )))
            }
            Err(e) => {
                return Err(GatewayError::Config(format!(
                    "read config {:?}: {}",
                    resolved.display().to_string(),
                    e
                )))
            }
        };

        let mut config = Self::from_yaml(&raw).map_err(|e| match e {
            GatewayError::Config(msg) => GatewayError::Config(format!(
                "config file {:?} {}",
                resolved.display().to_string(),
                msg
            )),
            other => other,
        })?;
        config.apply_env_overrides(&env);
        config.validate()?;
        Ok(config)
    }

    /// Parse YAML text without applying overrides or validation.
    pub fn from_yaml(raw: &str) -> Result<Self, GatewayError> {
        if raw.trim().is_empty() {
            return Err(GatewayError::Config("is empty".to_string()));
        }
        serde_yaml::from_str(raw).map_err(|e| GatewayError::Config(format!("decode: {}", e)))
    }

    /// Apply non-blank environment values on top of the file values.
    ///
    /// An unparsable port becomes `-1` so validation reports it.
    pub fn apply_env_overrides<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| {
            env(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(host) = non_blank(ENV_SERVER_HOST) {
            self.server.host = host;
        }
        if let Some(port) = non_blank(ENV_SERVER_PORT) {
            self.server.port = port.parse().unwrap_or(-1);
        }
        if let Some(base_url) = non_blank(ENV_GREEN_API_BASE_URL) {
            self.green_api.base_url = base_url;
        }
    }

    /// Check ranges and normalize the host and base URL in place.
    pub fn validate(&mut self) -> Result<(), GatewayError> {
        self.server.host = self.server.host.trim().to_string();
        if self.server.host.is_empty() {
            return Err(GatewayError::Config(
                "config: server.host is required".to_string(),
            ));
        }

        if !(1..=65535).contains(&self.server.port) {
            return Err(GatewayError::Config(
                "config: server.port must be in range 1..65535".to_string(),
            ));
        }

        if self.green_api.base_url.trim().is_empty() {
            return Err(GatewayError::Config(
                "config: green_api.base_url is required".to_string(),
            ));
        }
        self.green_api.base_url = validate_base_url(&self.green_api.base_url)
            .map_err(|e| GatewayError::Config(format!("config: {}", e)))?;
        Ok(())
    }
}

impl ServerConfig {
    /// Address to bind, in a form `tokio::net::TcpListener::bind` accepts.
    ///
    /// A blank or `0.0.0.0` host listens on all IPv4 interfaces; IPv6 literals
    /// are bracketed.
    pub fn listen_address(&self) -> String {
        let host = self.host.trim();
        if host.is_empty() || host == "0.0.0.0" {
            return format!("0.0.0.0:{}", self.port);
        }

        match host.parse::<IpAddr>() {
            Ok(IpAddr::V6(v6)) => format!("[{}]:{}", v6, self.port),
            _ => format!("{}:{}", host, self.port),
        }
    }
}

fn resolve_path<F>(path: Option<&Path>, env: &F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(p) = path.filter(|p| !p.as_os_str().is_empty()) {
        return p.to_path_buf();
    }
    env(ENV_CONFIG_PATH)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

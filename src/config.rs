//! Configuration management for devpanel.
//!
//! Handles loading configuration from a TOML file and environment variables: the
//! default device address and request settings.

use crate::device::{DeviceEndpoint, Scheme, DEFAULT_TIMEOUT};
use crate::error::{PanelError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Environment variable supplying a default device host.
pub const HOST_ENV: &str = "DEVPANEL_HOST";
/// Environment variable supplying a default device port.
pub const PORT_ENV: &str = "DEVPANEL_PORT";
/// Environment variable selecting https (`true`/`false`).
pub const HTTPS_ENV: &str = "DEVPANEL_HTTPS";

/// Main configuration structure for devpanel.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Default device address.
    #[serde(default)]
    pub device: DeviceConfig,

    /// Request settings.
    #[serde(default)]
    pub request: RequestConfig,
}

/// Default device address. Unset fields fall back to the environment, then built-ins.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Full base URL (`http://192.168.1.50:80`); overrides the other fields.
    pub url: Option<String>,

    /// Device host or IP address.
    pub host: Option<String>,

    /// Device port.
    pub port: Option<u16>,

    /// Use https instead of http.
    pub https: Option<bool>,
}

/// Request settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestConfig {
    /// Per-request timeout in milliseconds, for the probe and every action.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Accept self-signed device certificates over https.
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT.as_millis() as u64
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            accept_invalid_certs: false,
        }
    }
}

impl RequestConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl DeviceConfig {
    /// Creates a device config from a base URL such as `https://10.0.0.7:8443`.
    pub fn from_url(base_url: &str) -> Result<Self> {
        let url = Url::parse(base_url)
            .map_err(|e| PanelError::config(format!("Invalid device URL '{base_url}': {e}")))?;

        let https = match url.scheme() {
            "http" => false,
            "https" => true,
            other => {
                return Err(PanelError::config(format!(
                    "Invalid scheme '{other}'. Expected 'http' or 'https'"
                )))
            }
        };

        let host = url
            .host_str()
            .map(String::from)
            .ok_or_else(|| PanelError::config(format!("Device URL '{base_url}' has no host")))?;

        Ok(Self {
            url: None,
            host: Some(host),
            port: url.port(),
            https: Some(https),
        })
    }

    /// Expands `url` into the individual fields.
    pub fn resolve_url(&mut self) -> Result<()> {
        if let Some(base_url) = self.url.take() {
            let parsed = Self::from_url(&base_url)?;
            self.host = parsed.host;
            self.port = parsed.port.or(self.port);
            self.https = parsed.https;
        }
        Ok(())
    }

    /// Applies `DEVPANEL_*` environment variables as defaults.
    pub fn apply_env_defaults(&mut self) {
        self.apply_defaults_from(|key| std::env::var(key).ok());
    }

    /// Fills unset fields from `lookup`. Unparseable values are ignored.
    pub fn apply_defaults_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.host.is_none() {
            self.host = lookup(HOST_ENV).filter(|h| !h.trim().is_empty());
        }
        if self.port.is_none() {
            self.port = lookup(PORT_ENV).and_then(|p| p.trim().parse().ok());
        }
        if self.https.is_none() {
            self.https = lookup(HTTPS_ENV).and_then(|v| parse_flag(&v));
        }
    }

    /// The endpoint described by this config, with built-in defaults for unset fields.
    pub fn endpoint(&self) -> DeviceEndpoint {
        let scheme = Scheme::from_secure(self.https.unwrap_or(false));
        DeviceEndpoint::new(
            self.host.clone().unwrap_or_default(),
            self.port.unwrap_or_else(|| scheme.default_port()),
            scheme,
        )
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("devpanel")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields the defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| PanelError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(|e| {
            PanelError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })?;
        config.device.resolve_url()?;
        Ok(config)
    }
}

//! Device transport layer for devpanel.
//!
//! Provides a trait-based interface for issuing HTTP requests to the device, allowing
//! the real HTTP client and the in-memory mock to be used interchangeably.

pub mod api;
mod fetch;
mod http;
mod mock;

pub use fetch::{fetch_with_timeout, Completed, Fetcher, InFlight, RequestKind, DEFAULT_TIMEOUT};
pub use http::{HttpTransport, HttpTransportConfig};
pub use mock::{MockReply, MockTransport};

use crate::error::{PanelError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_util::sync::CancellationToken;

/// URL scheme used to reach the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    #[default]
    Http,
    Https,
}

impl Scheme {
    /// Picks the scheme from the "use secure scheme" flag.
    pub fn from_secure(secure: bool) -> Self {
        if secure {
            Self::Https
        } else {
            Self::Http
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }

    pub fn is_secure(&self) -> bool {
        matches!(self, Self::Https)
    }

    /// Returns the port used when none is given.
    pub fn default_port(&self) -> u16 {
        match self {
            Self::Http => 80,
            Self::Https => 443,
        }
    }
}

/// Address of the device being controlled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEndpoint {
    pub host: String,
    pub port: u16,
    pub scheme: Scheme,
}

impl Default for DeviceEndpoint {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: Scheme::Http.default_port(),
            scheme: Scheme::Http,
        }
    }
}

impl DeviceEndpoint {
    pub fn new(host: impl Into<String>, port: u16, scheme: Scheme) -> Self {
        Self {
            host: host.into(),
            port,
            scheme,
        }
    }

    /// True once a host has been supplied.
    pub fn is_specified(&self) -> bool {
        !self.host.trim().is_empty()
    }

    /// Returns `scheme://host:port`.
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme.as_str(), self.host, self.port)
    }

    /// Joins the base URL with an endpoint path such as `/api/joke`.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }
}

impl fmt::Display for DeviceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base_url())
    }
}

/// HTTP methods accepted by the custom endpoint control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
        }
    }

    /// Parses a method name, case-insensitively.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            "PATCH" => Ok(Self::Patch),
            other => Err(PanelError::validation(format!(
                "Unsupported HTTP method '{other}'. Expected GET, POST, PUT, DELETE or PATCH"
            ))),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single request to the device.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceRequest {
    pub method: HttpMethod,
    pub url: String,
    /// JSON payload; sent with `Content-Type: application/json` when present.
    pub body: Option<serde_json::Value>,
}

impl DeviceRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            body: None,
        }
    }

    pub fn new(method: HttpMethod, url: impl Into<String>, body: Option<serde_json::Value>) -> Self {
        Self {
            method,
            url: url.into(),
            body,
        }
    }
}

/// A device response, before status classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceResponse {
    pub status: u16,
    pub body: String,
}

impl DeviceResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait defining the interface for device transports.
///
/// Implementations must stop work and return promptly once `cancel` fires. Status codes
/// are not interpreted here; any HTTP response is `Ok`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Executes a request and returns the raw response.
    async fn execute(
        &self,
        request: DeviceRequest,
        cancel: CancellationToken,
    ) -> Result<DeviceResponse>;
}

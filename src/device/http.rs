//! HTTP transport implementation.
//!
//! Implements the Transport trait with reqwest. Timeouts are enforced by the caller
//! through the cancellation token, not by the client.

use async_trait::async_trait;
use reqwest::{Client, Method};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::device::{DeviceRequest, DeviceResponse, HttpMethod, Transport};
use crate::error::{PanelError, Result};

/// Upper bound on the TCP/TLS connect phase, independent of the request timeout.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// HTTP transport configuration.
#[derive(Debug, Clone, Default)]
pub struct HttpTransportConfig {
    /// Accept self-signed or otherwise invalid TLS certificates.
    pub accept_invalid_certs: bool,
}

/// reqwest-backed device transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport with default settings.
    pub fn new() -> Result<Self> {
        Self::with_config(HttpTransportConfig::default())
    }

    /// Creates a transport with the given configuration.
    pub fn with_config(config: HttpTransportConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| PanelError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    fn method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Patch => Method::PATCH,
        }
    }

    async fn send(&self, request: DeviceRequest) -> Result<DeviceResponse> {
        let mut builder = self
            .client
            .request(Self::method(request.method), &request.url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                PanelError::transport("Request timed out")
            } else if e.is_connect() {
                PanelError::transport(format!("Failed to connect to {}", request.url))
            } else if e.is_builder() {
                PanelError::validation(format!("Invalid request URL: {}", request.url))
            } else {
                PanelError::transport(format!("Request failed: {}", e))
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| PanelError::transport(format!("Failed to read response: {}", e)))?;

        Ok(DeviceResponse { status, body })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(
        &self,
        request: DeviceRequest,
        cancel: CancellationToken,
    ) -> Result<DeviceResponse> {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => Err(PanelError::transport("Request aborted")),
            result = self.send(request) => result,
        }
    }
}

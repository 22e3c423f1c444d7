//! Connection manager for the device endpoint and its liveness.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::device::api::ROOT_PATH;
use crate::device::{
    Completed, DeviceEndpoint, DeviceRequest, Fetcher, InFlight, RequestKind, Scheme,
};
use crate::error::{PanelError, Result};
use crate::persistence::{KeyValueStore, HOST_KEY, PORT_KEY, USE_HTTPS_KEY};

/// Hint shown when a secure probe fails at the transport level.
pub const CERTIFICATE_HINT: &str = "If the device uses a self-signed certificate, trust it first \
     or set request.accept_invalid_certs = true in the config file";

/// Whether the device has answered a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

impl ConnectionState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Connected => "Connected",
        }
    }
}

/// Device status fields shown next to the connection indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DeviceStatus {
    /// The device answered the last probe.
    pub online: bool,
    /// Round trip of the last successful probe or request.
    pub last_response_ms: Option<u64>,
}

/// A successful probe.
#[derive(Debug)]
pub struct ProbeSuccess {
    pub elapsed: Duration,
    /// Body of the root page.
    pub body: String,
    /// Set when the endpoint could not be saved; the connection itself stands.
    pub persist_error: Option<PanelError>,
}

/// How a finished probe was applied.
#[derive(Debug)]
pub enum ProbeOutcome {
    Connected(ProbeSuccess),
    /// The endpoint changed while the probe was running; nothing was applied.
    Superseded { target: DeviceEndpoint },
}

/// Owns the device endpoint, the connection state and the saved-endpoint storage.
pub struct ConnectionManager {
    endpoint: DeviceEndpoint,
    state: ConnectionState,
    status: DeviceStatus,
    fetcher: Fetcher,
    store: Arc<dyn KeyValueStore>,
}

impl ConnectionManager {
    /// Creates a disconnected manager with the default endpoint.
    pub fn new(fetcher: Fetcher, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            endpoint: DeviceEndpoint::default(),
            state: ConnectionState::Disconnected,
            status: DeviceStatus::default(),
            fetcher,
            store,
        }
    }

    /// Replaces the starting endpoint.
    pub fn with_endpoint(mut self, endpoint: DeviceEndpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Sets the endpoint from user input.
    ///
    /// `port` is the text the user typed; empty means the scheme's default port. Nothing is
    /// changed when validation fails.
    pub fn configure(&mut self, host: &str, port: &str, use_secure_scheme: bool) -> Result<()> {
        let host = host.trim();
        if host.is_empty() {
            return Err(PanelError::validation("Device host is required"));
        }

        let scheme = Scheme::from_secure(use_secure_scheme);
        let port = parse_port(port, scheme)?;

        self.endpoint = DeviceEndpoint::new(host, port, scheme);
        debug!("Endpoint configured: {}", self.endpoint);
        Ok(())
    }

    pub fn endpoint(&self) -> &DeviceEndpoint {
        &self.endpoint
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn status(&self) -> DeviceStatus {
        self.status
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Starts a liveness probe of the device root.
    pub fn start_probe(&self) -> Result<InFlight> {
        if !self.endpoint.is_specified() {
            return Err(PanelError::validation("Device host is required"));
        }

        let url = self.endpoint.url_for(ROOT_PATH);
        info!("Probing {}", url);
        let kind = RequestKind::Probe {
            target: self.endpoint.clone(),
        };
        Ok(self.fetcher.start(kind, DeviceRequest::get(url)))
    }

    /// Applies the outcome of a probe started with [`Self::start_probe`].
    ///
    /// A probe of an endpoint that has since been replaced is dropped without touching
    /// the state or storage, whatever its result.
    pub async fn finish_probe(&mut self, done: Completed) -> Result<ProbeOutcome> {
        let RequestKind::Probe { target } = done.kind else {
            return Err(PanelError::internal("finish_probe called with a non-probe request"));
        };

        if !self.is_current(&target) {
            debug!("Dropping probe result for {target}; endpoint is now {}", self.endpoint);
            return Ok(ProbeOutcome::Superseded { target });
        }

        match done.result {
            Ok(response) => {
                self.state = ConnectionState::Connected;
                self.status = DeviceStatus {
                    online: true,
                    last_response_ms: Some(done.elapsed.as_millis() as u64),
                };
                info!("Connected to {} in {:?}", target, done.elapsed);

                let persist_error = self.persist_endpoint(&target).await.err();
                if let Some(e) = &persist_error {
                    warn!("Could not save endpoint: {e}");
                }

                Ok(ProbeOutcome::Connected(ProbeSuccess {
                    elapsed: done.elapsed,
                    body: response.body,
                    persist_error,
                }))
            }
            Err(e) => {
                warn!("Probe of {} failed: {e}", target);
                self.mark_disconnected();
                Err(e)
            }
        }
    }

    /// Probes the device once: no retries.
    pub async fn probe(&mut self) -> Result<ProbeSuccess> {
        let in_flight = self.start_probe().inspect_err(|_| self.mark_disconnected())?;
        let done = in_flight.await;
        match self.finish_probe(done).await? {
            ProbeOutcome::Connected(success) => Ok(success),
            ProbeOutcome::Superseded { target } => Err(PanelError::internal(format!(
                "endpoint changed while probing {target}"
            ))),
        }
    }

    /// True when `target` is the endpoint currently configured.
    pub fn is_current(&self, target: &DeviceEndpoint) -> bool {
        &self.endpoint == target
    }

    /// Drops to Disconnected and clears the device status fields.
    pub fn mark_disconnected(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.status = DeviceStatus::default();
    }

    /// Records the round trip of a successful request. Ignored while disconnected, where
    /// the status fields stay cleared.
    pub fn record_response(&mut self, elapsed: Duration) {
        if self.is_connected() {
            self.status.last_response_ms = Some(elapsed.as_millis() as u64);
        }
    }

    /// Returns the certificate hint when `error` is a transport failure on https.
    pub fn certificate_hint(&self, error: &PanelError) -> Option<&'static str> {
        (self.endpoint.scheme.is_secure() && error.is_transport()).then_some(CERTIFICATE_HINT)
    }

    /// Saves host, port and scheme flag of the current endpoint.
    pub async fn persist(&self) -> Result<()> {
        self.persist_endpoint(&self.endpoint).await
    }

    async fn persist_endpoint(&self, endpoint: &DeviceEndpoint) -> Result<()> {
        self.store.set(HOST_KEY, &endpoint.host).await?;
        self.store
            .set(PORT_KEY, &endpoint.port.to_string())
            .await?;
        self.store
            .set(USE_HTTPS_KEY, &endpoint.scheme.is_secure().to_string())
            .await?;
        Ok(())
    }

    /// Restores saved endpoint fields. Missing or unreadable values leave the current
    /// ones in place. Returns true when at least one field was restored.
    pub async fn load_persisted(&mut self) -> Result<bool> {
        let mut restored = false;

        if let Some(host) = self.store.get(HOST_KEY).await? {
            if !host.trim().is_empty() {
                self.endpoint.host = host.trim().to_string();
                restored = true;
            }
        }

        if let Some(port) = self.store.get(PORT_KEY).await? {
            match port.trim().parse::<u16>() {
                Ok(port) if port > 0 => {
                    self.endpoint.port = port;
                    restored = true;
                }
                _ => warn!("Ignoring saved port '{port}'"),
            }
        }

        if let Some(flag) = self.store.get(USE_HTTPS_KEY).await? {
            match flag.trim().parse::<bool>() {
                Ok(secure) => {
                    self.endpoint.scheme = Scheme::from_secure(secure);
                    restored = true;
                }
                Err(_) => warn!("Ignoring saved https flag '{flag}'"),
            }
        }

        if restored {
            info!("Restored saved endpoint {}", self.endpoint);
        }
        Ok(restored)
    }
}

/// Parses port text; empty text selects the scheme default.
fn parse_port(port: &str, scheme: Scheme) -> Result<u16> {
    let port = port.trim();
    if port.is_empty() {
        return Ok(scheme.default_port());
    }
    match port.parse::<u16>() {
        Ok(p) if p > 0 => Ok(p),
        _ => Err(PanelError::validation(format!("Invalid port '{port}'"))),
    }
}

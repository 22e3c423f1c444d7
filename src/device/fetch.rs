//! Timeout-bounded request helper shared by the probe and the dispatcher.

use super::{DeviceEndpoint, DeviceRequest, DeviceResponse, HttpMethod, Transport};
use crate::error::{PanelError, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// What an in-flight request was issued for, and where it was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    /// Liveness probe of the device root.
    Probe { target: DeviceEndpoint },
    /// A user action routed through the dispatcher.
    Command {
        method: HttpMethod,
        path: String,
        target: DeviceEndpoint,
    },
}

impl RequestKind {
    /// Endpoint the request was sent to.
    pub fn target(&self) -> &DeviceEndpoint {
        match self {
            Self::Probe { target } | Self::Command { target, .. } => target,
        }
    }
}

/// A finished request, ready to be applied to panel state.
#[derive(Debug)]
pub struct Completed {
    pub kind: RequestKind,
    pub elapsed: Duration,
    /// `Ok` only for 2xx responses; other statuses arrive as `PanelError::Protocol`.
    pub result: Result<DeviceResponse>,
}

impl Completed {
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }
}

/// A request that has been started but not yet applied.
///
/// Owns everything it needs, so several can be polled side by side while the panel
/// state stays with its owner.
pub type InFlight = BoxFuture<'static, Completed>;

/// Issues requests through a transport with a per-request timeout.
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Starts a request. Nothing is sent until the returned future is polled.
    pub fn start(&self, kind: RequestKind, request: DeviceRequest) -> InFlight {
        let transport = Arc::clone(&self.transport);
        let timeout = self.timeout;

        async move {
            let started = Instant::now();
            let result = fetch_with_timeout(transport.as_ref(), request, timeout).await;
            Completed {
                kind,
                elapsed: started.elapsed(),
                result,
            }
        }
        .boxed()
    }
}

/// Executes `request`, cancelling it if it has not finished within `timeout`.
///
/// The timer and the cancellation token live only for this call; both are released on
/// success, failure, timeout and when the caller drops the future.
pub async fn fetch_with_timeout(
    transport: &dyn Transport,
    request: DeviceRequest,
    timeout: Duration,
) -> Result<DeviceResponse> {
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    debug!("{} {}", request.method, request.url);

    let response = tokio::select! {
        biased;

        result = transport.execute(request, cancel.clone()) => result?,
        _ = tokio::time::sleep(timeout) => {
            cancel.cancel();
            return Err(PanelError::timeout(timeout));
        }
    };

    if response.is_success() {
        Ok(response)
    } else {
        debug!("Device answered {}: {}", response.status, response.body);
        Err(PanelError::protocol(response.status))
    }
}

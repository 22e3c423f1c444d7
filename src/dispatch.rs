//! Request dispatcher for device actions.
//!
//! Sends user-triggered requests to the connected device and turns every outcome into
//! exactly one activity log entry. Errors never escape this boundary: callers get a
//! [`RequestOutcome`] describing what happened.

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::activity::ActivityLog;
use crate::connection::ConnectionManager;
use crate::device::{Completed, DeviceRequest, Fetcher, HttpMethod, InFlight, RequestKind};
use crate::error::PanelError;

/// Number of body characters copied into the activity log.
pub const LOG_BODY_PREVIEW_CHARS: usize = 100;

/// Message logged when an action is attempted without a connection.
pub const NOT_CONNECTED_MESSAGE: &str = "Connect to the device first";

/// Result of a dispatched request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum RequestOutcome {
    Success { data: String, elapsed_ms: u64 },
    Failure { error: String, elapsed_ms: u64 },
}

impl RequestOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Full response body of a successful request.
    pub fn data(&self) -> Option<&str> {
        match self {
            Self::Success { data, .. } => Some(data),
            Self::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(error),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        match self {
            Self::Success { elapsed_ms, .. } | Self::Failure { elapsed_ms, .. } => *elapsed_ms,
        }
    }
}

/// Issues timeout-bounded requests against the connected device.
#[derive(Clone)]
pub struct RequestDispatcher {
    fetcher: Fetcher,
}

impl RequestDispatcher {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }

    pub fn timeout(&self) -> Duration {
        self.fetcher.timeout()
    }

    /// Starts a request to `path` on the connected device.
    ///
    /// Returns `None` without touching the network when there is no connection; a warning
    /// is logged in that case.
    pub fn start(
        &self,
        connection: &ConnectionManager,
        log: &mut ActivityLog,
        path: &str,
        method: HttpMethod,
        body: Option<serde_json::Value>,
    ) -> Option<InFlight> {
        if !connection.is_connected() {
            debug!("Refusing {method} {path}: {}", PanelError::NotConnected);
            log.warning(NOT_CONNECTED_MESSAGE);
            return None;
        }

        let url = connection.endpoint().url_for(path);
        debug!("Sending {method} request to {path}");

        let kind = RequestKind::Command {
            method,
            path: path.to_string(),
            target: connection.endpoint().clone(),
        };
        Some(
            self.fetcher
                .start(kind, DeviceRequest::new(method, url, body)),
        )
    }

    /// Applies a finished request: logs it, updates the response time and drops the
    /// connection on failure.
    ///
    /// Results for an endpoint that has since been replaced are still logged, but leave
    /// the connection alone.
    pub fn complete(
        &self,
        connection: &mut ConnectionManager,
        log: &mut ActivityLog,
        done: Completed,
    ) -> RequestOutcome {
        let elapsed_ms = done.elapsed_ms();
        let current = connection.is_current(done.kind.target());
        if !current {
            debug!("Result for {} arrived after the endpoint changed", done.kind.target());
        }

        match done.result {
            Ok(response) => {
                if current {
                    connection.record_response(done.elapsed);
                }
                log.success(format!(
                    "Request succeeded ({elapsed_ms}ms): {}",
                    preview(&response.body)
                ));
                RequestOutcome::Success {
                    data: response.body,
                    elapsed_ms,
                }
            }
            Err(e) => {
                if current {
                    connection.mark_disconnected();
                }
                log.error(format!("Request failed: {e}"));
                RequestOutcome::Failure {
                    error: e.to_string(),
                    elapsed_ms,
                }
            }
        }
    }

    /// Sends a request and waits for it.
    pub async fn send(
        &self,
        connection: &mut ConnectionManager,
        log: &mut ActivityLog,
        path: &str,
        method: HttpMethod,
        body: Option<serde_json::Value>,
    ) -> Option<RequestOutcome> {
        let in_flight = self.start(connection, log, path, method, body)?;
        let done = in_flight.await;
        Some(self.complete(connection, log, done))
    }
}

/// First [`LOG_BODY_PREVIEW_CHARS`] characters of a response body.
fn preview(body: &str) -> String {
    body.chars().take(LOG_BODY_PREVIEW_CHARS).collect()
}

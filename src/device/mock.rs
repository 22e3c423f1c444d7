//! Mock device transport for testing.
//!
//! Provides an in-memory transport for headless runs and tests. Replies are scripted per
//! path; every request and cancellation token is recorded for inspection.

use super::{DeviceRequest, DeviceResponse, Transport};
use crate::error::{PanelError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// How the mock answers a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    /// Answer immediately with the given status and body.
    Status { status: u16, body: String },
    /// Answer after a delay, unless cancelled first.
    Delayed {
        delay: Duration,
        status: u16,
        body: String,
    },
    /// Fail with a transport error (refused, reset, ...).
    Fail(String),
    /// Never answer; only returns once the request is cancelled.
    Hang,
}

impl MockReply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self::status(200, body)
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    pub fn delayed(delay: Duration, body: impl Into<String>) -> Self {
        Self::Delayed {
            delay,
            status: 200,
            body: body.into(),
        }
    }
}

#[derive(Debug)]
struct MockState {
    routes: HashMap<String, MockReply>,
    default_reply: MockReply,
    calls: Vec<DeviceRequest>,
    tokens: Vec<CancellationToken>,
    pending: usize,
}

/// A mock transport that returns scripted replies.
#[derive(Debug, Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Creates a mock that answers every path with 200 "OK".
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                routes: HashMap::new(),
                default_reply: MockReply::ok("OK"),
                calls: Vec::new(),
                tokens: Vec::new(),
                pending: 0,
            })),
        }
    }

    /// Creates a mock whose replies resemble the stock device firmware.
    pub fn device_like() -> Self {
        Self::new()
            .with_route("/", MockReply::ok("<h1>ESP32 Web Server</h1>"))
            .with_route("/api/led", MockReply::ok(r#"{"status":"ok","action":"LED ON"}"#))
            .with_route(
                "/api/joke",
                MockReply::ok(r#"{"status":"ok","message":"Fetching joke..."}"#),
            )
            .with_route(
                "/api/oled",
                MockReply::ok(r#"{"status":"ok","message":"Text displayed on OLED"}"#),
            )
            .with_route("/api/gpio", MockReply::ok(r#"{"status":"ok"}"#))
    }

    /// Sets the reply for a path (query string ignored).
    pub fn with_route(self, path: impl Into<String>, reply: MockReply) -> Self {
        self.set_route(path, reply);
        self
    }

    /// Sets the reply for paths without a route.
    pub fn with_default(self, reply: MockReply) -> Self {
        self.lock().default_reply = reply;
        self
    }

    /// Replaces the reply for a path on a shared mock.
    pub fn set_route(&self, path: impl Into<String>, reply: MockReply) {
        self.lock().routes.insert(path.into(), reply);
    }

    /// All requests received so far, oldest first.
    pub fn calls(&self) -> Vec<DeviceRequest> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Requests currently executing inside the mock.
    pub fn pending_count(&self) -> usize {
        self.lock().pending
    }

    /// True when every cancellation token handed to the mock has been cancelled.
    pub fn all_tokens_cancelled(&self) -> bool {
        self.lock().tokens.iter().all(|t| t.is_cancelled())
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn reply_for(state: &MockState, url: &str) -> MockReply {
        let path = Url::parse(url)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| url.to_string());
        state
            .routes
            .get(&path)
            .cloned()
            .unwrap_or_else(|| state.default_reply.clone())
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks a request inside the mock until its future finishes or is dropped.
struct PendingGuard {
    state: Arc<Mutex<MockState>>,
}

impl PendingGuard {
    fn new(state: Arc<Mutex<MockState>>) -> Self {
        state.lock().unwrap_or_else(|e| e.into_inner()).pending += 1;
        Self { state }
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.pending = state.pending.saturating_sub(1);
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(
        &self,
        request: DeviceRequest,
        cancel: CancellationToken,
    ) -> Result<DeviceResponse> {
        let reply = {
            let mut state = self.lock();
            let reply = Self::reply_for(&state, &request.url);
            state.calls.push(request);
            state.tokens.push(cancel.clone());
            reply
        };
        let _pending = PendingGuard::new(Arc::clone(&self.state));

        match reply {
            MockReply::Status { status, body } => Ok(DeviceResponse::new(status, body)),
            MockReply::Fail(message) => Err(PanelError::transport(message)),
            MockReply::Delayed {
                delay,
                status,
                body,
            } => {
                tokio::select! {
                    _ = cancel.cancelled() => Err(PanelError::transport("Request aborted")),
                    _ = tokio::time::sleep(delay) => Ok(DeviceResponse::new(status, body)),
                }
            }
            MockReply::Hang => {
                cancel.cancelled().await;
                Err(PanelError::transport("Request aborted"))
            }
        }
    }
}

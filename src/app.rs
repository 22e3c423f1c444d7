//! Core controller for devpanel.
//!
//! The [`Panel`] owns the connection manager, the request dispatcher and the activity
//! log, and turns commands into device calls. Presentation layers (TUI, headless
//! runner) drive it and render its log; they hold no device state of their own.
//!
//! Calls are split in two: [`Panel::begin`] validates a command and hands back a
//! `'static` in-flight future, [`Panel::finish`] applies the finished call. The TUI polls
//! several in-flight futures side by side; [`Panel::run`] simply awaits in between.

use std::sync::Arc;

use tracing::debug;

use crate::activity::ActivityLog;
use crate::commands::help::{HELP_TEXT, SHORTCUT_TIP};
use crate::commands::{Command, CommandRouter, ConnectArgs};
use crate::connection::{ConnectionManager, ConnectionState, ProbeOutcome};
use crate::device::api::{gpio_path, JOKE_PATH};
use crate::device::{Completed, DeviceEndpoint, Fetcher, HttpMethod, InFlight, RequestKind};
use crate::dispatch::{RequestDispatcher, RequestOutcome};
use crate::error::{PanelError, Result};
use crate::persistence::KeyValueStore;

/// Result of starting a command.
pub enum Begin {
    /// Handled locally; `ok` is false when the command was rejected.
    Finished { ok: bool },
    /// A device call is running; pass its result to [`Panel::finish`].
    Pending(InFlight),
    /// The user asked to exit.
    Quit,
}

/// Result of running a command to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue { ok: bool },
    Quit,
}

/// The device control panel.
pub struct Panel {
    log: ActivityLog,
    connection: ConnectionManager,
    dispatcher: RequestDispatcher,
}

impl Panel {
    /// Creates a panel whose probe and requests share one fetcher.
    pub fn new(fetcher: Fetcher, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            log: ActivityLog::new(),
            connection: ConnectionManager::new(fetcher.clone(), store),
            dispatcher: RequestDispatcher::new(fetcher),
        }
    }

    /// Sets the starting endpoint (config file and environment defaults).
    pub fn with_endpoint(mut self, endpoint: DeviceEndpoint) -> Self {
        self.connection = self.connection.with_endpoint(endpoint);
        self
    }

    pub fn log(&self) -> &ActivityLog {
        &self.log
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Restores the last saved endpoint. Storage failures become a warning entry.
    pub async fn restore(&mut self) {
        if let Err(e) = self.connection.load_persisted().await {
            self.log
                .warning(format!("Could not load the saved device address: {e}"));
        }
    }

    /// Applies endpoint overrides without probing.
    pub fn apply_connect_args(&mut self, args: &ConnectArgs) -> Result<()> {
        if args.is_empty() {
            return Ok(());
        }

        let current = self.connection.endpoint();
        let was_secure = current.scheme.is_secure();
        let secure = args.secure.unwrap_or(was_secure);
        let host = args.host.clone().unwrap_or_else(|| current.host.clone());
        // Switching scheme without naming a port moves to the new scheme's default.
        let port = match &args.port {
            Some(port) => port.clone(),
            None if secure != was_secure => String::new(),
            None => current.port.to_string(),
        };

        self.connection.configure(&host, &port, secure)
    }

    /// Writes the entries shown when the panel opens.
    pub fn announce_startup(&mut self, show_shortcut_tip: bool) {
        self.log
            .info("Panel ready. Default: HTTP on port 80, no certificate needed");
        if self.connection.endpoint().scheme.is_secure() {
            self.log.warning(
                "HTTPS is selected: make sure the device supports it and its certificate is trusted",
            );
        } else {
            self.log.success("Using plain HTTP");
        }
        self.log.success("Welcome to devpanel!");
        if show_shortcut_tip {
            self.log.info(SHORTCUT_TIP);
        }
    }

    /// Adds a warning entry for problems found outside a command, such as at startup.
    pub fn log_warning(&mut self, message: impl Into<String>) {
        self.log.warning(message);
    }

    /// Clears the activity log.
    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// Parses and starts one input line. Parse errors are logged.
    pub fn begin_line(&mut self, line: &str) -> Begin {
        match CommandRouter::parse(line) {
            Ok(command) => self.begin(command),
            Err(e) => {
                self.log.append(e.to_string(), e.severity());
                Begin::Finished { ok: false }
            }
        }
    }

    /// Starts a command.
    pub fn begin(&mut self, command: Command) -> Begin {
        debug!("Command: {:?}", command);

        match command {
            Command::Connect(args) => self.begin_connect(&args),
            Command::Reconnect => self.begin_probe(),
            Command::Led { action, method } => self.begin_request(&action.path(), method, None),
            Command::Joke => self.begin_request(JOKE_PATH, HttpMethod::Get, None),
            Command::Oled(oled) => self.begin_request(&oled.path(), HttpMethod::Get, None),
            Command::Gpio { pin, level } => {
                self.begin_request(&gpio_path(pin, level), HttpMethod::Get, None)
            }
            Command::Custom { method, path, body } => self.begin_request(&path, method, body),
            Command::Status => {
                self.log_status();
                Begin::Finished { ok: true }
            }
            Command::ClearLog => {
                self.clear_log();
                Begin::Finished { ok: true }
            }
            Command::Help => {
                for line in HELP_TEXT.lines().filter(|l| !l.trim().is_empty()) {
                    self.log.info(line.trim_end());
                }
                Begin::Finished { ok: true }
            }
            Command::Quit => Begin::Quit,
        }
    }

    /// Applies a finished call and logs its outcome.
    pub async fn finish(&mut self, done: Completed) -> RequestOutcome {
        match done.kind {
            RequestKind::Probe { .. } => self.finish_probe(done).await,
            RequestKind::Command { .. } => {
                self.dispatcher
                    .complete(&mut self.connection, &mut self.log, done)
            }
        }
    }

    /// Runs a command to completion.
    pub async fn run(&mut self, command: Command) -> Flow {
        match self.begin(command) {
            Begin::Finished { ok } => Flow::Continue { ok },
            Begin::Pending(in_flight) => {
                let done = in_flight.await;
                let ok = self.finish(done).await.is_success();
                Flow::Continue { ok }
            }
            Begin::Quit => Flow::Quit,
        }
    }

    /// Parses and runs one input line.
    pub async fn run_line(&mut self, line: &str) -> Flow {
        match CommandRouter::parse(line) {
            Ok(command) => self.run(command).await,
            Err(e) => {
                self.log.append(e.to_string(), e.severity());
                Flow::Continue { ok: false }
            }
        }
    }

    fn begin_connect(&mut self, args: &ConnectArgs) -> Begin {
        if let Err(e) = self.apply_connect_args(args) {
            self.report_connect_error(&e);
            return Begin::Finished { ok: false };
        }
        self.begin_probe()
    }

    fn begin_probe(&mut self) -> Begin {
        if self.connection.endpoint().is_specified() {
            let scheme_note = if self.connection.endpoint().scheme.is_secure() {
                "Using HTTPS (device certificate must be trusted)"
            } else {
                "Using HTTP (no certificate needed)"
            };
            self.log.info(scheme_note);
            self.log
                .info(format!("Connecting to {}...", self.connection.endpoint()));
        }

        match self.connection.start_probe() {
            Ok(in_flight) => Begin::Pending(in_flight),
            Err(e) => {
                self.connection.mark_disconnected();
                self.report_connect_error(&e);
                Begin::Finished { ok: false }
            }
        }
    }

    async fn finish_probe(&mut self, done: Completed) -> RequestOutcome {
        let elapsed_ms = done.elapsed_ms();

        match self.connection.finish_probe(done).await {
            Ok(ProbeOutcome::Superseded { target }) => {
                let message =
                    format!("Ignored the reply from {target}: the device address has changed");
                self.log.info(message.clone());
                RequestOutcome::Failure {
                    error: message,
                    elapsed_ms,
                }
            }
            Ok(ProbeOutcome::Connected(success)) => {
                self.log
                    .success(format!("Connected! Response time: {elapsed_ms}ms"));
                if let Some(e) = success.persist_error {
                    self.log
                        .warning(format!("Could not save the device address: {e}"));
                }
                RequestOutcome::Success {
                    data: success.body,
                    elapsed_ms,
                }
            }
            Err(e) => {
                self.log.error(format!("Connection failed: {e}"));
                if let Some(hint) = self.connection.certificate_hint(&e) {
                    self.log.warning(format!("Hint: {hint}"));
                }
                RequestOutcome::Failure {
                    error: e.to_string(),
                    elapsed_ms,
                }
            }
        }
    }

    fn begin_request(
        &mut self,
        path: &str,
        method: HttpMethod,
        body: Option<serde_json::Value>,
    ) -> Begin {
        match self
            .dispatcher
            .start(&self.connection, &mut self.log, path, method, body)
        {
            Some(in_flight) => Begin::Pending(in_flight),
            None => Begin::Finished { ok: false },
        }
    }

    /// A missing host is an error for the connect action; other input problems warn.
    fn report_connect_error(&mut self, error: &PanelError) {
        if is_missing_host(error) {
            self.log.error("Enter the device host first");
        } else {
            self.log.append(error.to_string(), error.severity());
        }
    }

    fn log_status(&mut self) {
        let endpoint = self.connection.endpoint();
        let target = if endpoint.is_specified() {
            endpoint.to_string()
        } else {
            "(no host set)".to_string()
        };
        let last = self
            .connection
            .status()
            .last_response_ms
            .map(|ms| format!("{ms}ms"))
            .unwrap_or_else(|| "-".to_string());

        let message = format!(
            "Endpoint: {target} | State: {} | Last response: {last} | Timeout: {}ms",
            self.state().label(),
            self.dispatcher.timeout().as_millis()
        );
        self.log.info(message);
    }
}

fn is_missing_host(error: &PanelError) -> bool {
    matches!(error, PanelError::Validation(msg) if msg.contains("host is required"))
}

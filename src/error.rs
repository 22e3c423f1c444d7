//! Error types for devpanel.
//!
//! Defines the main error enum used throughout the application.

use crate::activity::Severity;
use std::time::Duration;
use thiserror::Error;

/// Main error type for devpanel operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PanelError {
    /// Missing or malformed user input (host, pin, text, endpoint, etc.)
    #[error("Validation error: {0}")]
    Validation(String),

    /// An action was attempted before a successful probe.
    #[error("Not connected to a device")]
    NotConnected,

    /// The device answered with a non-2xx status.
    #[error("HTTP {status}")]
    Protocol { status: u16 },

    /// Network failure (refused, reset, DNS, TLS, etc.)
    #[error("{0}")]
    Transport(String),

    /// The request did not complete within its timeout.
    #[error("Request timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    /// Configuration errors (invalid config file, bad CLI values, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// State database errors.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Internal application errors (terminal setup, unexpected states, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PanelError {
    /// Creates a validation error with the given message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a protocol error for the given HTTP status.
    pub fn protocol(status: u16) -> Self {
        Self::Protocol { status }
    }

    /// Creates a transport error with the given message.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Creates a timeout error for the given limit.
    pub fn timeout(after: Duration) -> Self {
        Self::Timeout {
            after_ms: after.as_millis() as u64,
        }
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a persistence error with the given message.
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// True for network failures and timeouts.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout { .. })
    }

    /// True only for timeouts.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns the HTTP status for protocol errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Protocol { status } => Some(*status),
            _ => None,
        }
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Validation Error",
            Self::NotConnected => "Not Connected",
            Self::Protocol { .. } => "Protocol Error",
            Self::Transport(_) | Self::Timeout { .. } => "Transport Error",
            Self::Config(_) => "Configuration Error",
            Self::Persistence(_) => "Persistence Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Severity used when this error is written to the activity log.
    pub fn severity(&self) -> Severity {
        match self {
            Self::Validation(_) | Self::NotConnected => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// Result type alias using PanelError.
pub type Result<T> = std::result::Result<T, PanelError>;

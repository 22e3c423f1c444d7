//! Paths of the fixed device endpoints.
//!
//! Builds the path-plus-query strings handed to the dispatcher. User input is validated
//! here so that malformed values never reach the network.

use crate::error::{PanelError, Result};
use std::fmt;
use url::form_urlencoded;

/// Liveness endpoint.
pub const ROOT_PATH: &str = "/";

/// Joke trigger endpoint.
pub const JOKE_PATH: &str = "/api/joke";

/// LED actions understood by the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedAction {
    On,
    Off,
    Toggle,
}

impl LedAction {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            "toggle" => Ok(Self::Toggle),
            "" => Err(PanelError::validation("LED action is required (on, off or toggle)")),
            other => Err(PanelError::validation(format!(
                "Unknown LED action '{other}'. Expected on, off or toggle"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
            Self::Toggle => "toggle",
        }
    }

    /// Returns `/api/led?action=<action>`.
    pub fn path(&self) -> String {
        format!("/api/led?action={}", self.as_str())
    }
}

/// Commands for the OLED display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OledCommand {
    /// Blank the display.
    Clear,
    /// Show free-form text.
    Text(String),
}

impl OledCommand {
    /// Builds a text command, rejecting empty text.
    pub fn text(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.is_empty() {
            return Err(PanelError::validation("Text to display is required"));
        }
        Ok(Self::Text(text))
    }

    /// Returns `/api/oled?action=clear` or `/api/oled?text=<url-encoded>`.
    pub fn path(&self) -> String {
        match self {
            Self::Clear => "/api/oled?action=clear".to_string(),
            Self::Text(text) => {
                let encoded: String = form_urlencoded::byte_serialize(text.as_bytes()).collect();
                format!("/api/oled?text={encoded}")
            }
        }
    }
}

/// Output level for a GPIO pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioLevel {
    Low,
    High,
}

impl GpioLevel {
    /// Accepts `0`/`1` as well as `low`/`high`.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "0" | "low" => Ok(Self::Low),
            "1" | "high" => Ok(Self::High),
            "" => Err(PanelError::validation("GPIO level is required (0 or 1)")),
            other => Err(PanelError::validation(format!(
                "Invalid GPIO level '{other}'. Expected 0 or 1"
            ))),
        }
    }

    pub fn as_digit(&self) -> u8 {
        match self {
            Self::Low => 0,
            Self::High => 1,
        }
    }
}

impl fmt::Display for GpioLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_digit())
    }
}

/// Parses a GPIO pin number as typed by the user.
pub fn parse_pin(s: &str) -> Result<u8> {
    let s = s.trim();
    if s.is_empty() {
        return Err(PanelError::validation("GPIO pin number is required"));
    }
    s.parse::<u8>()
        .map_err(|_| PanelError::validation(format!("Invalid GPIO pin '{s}'")))
}

/// Returns `/api/gpio?pin=<n>&level=<0|1>`.
pub fn gpio_path(pin: u8, level: GpioLevel) -> String {
    format!("/api/gpio?pin={pin}&level={level}")
}

/// Normalizes a user-supplied endpoint path, adding the leading slash if missing.
pub fn custom_path(endpoint: &str) -> Result<String> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Err(PanelError::validation("Endpoint path is required"));
    }
    if endpoint.starts_with('/') {
        Ok(endpoint.to_string())
    } else {
        Ok(format!("/{endpoint}"))
    }
}

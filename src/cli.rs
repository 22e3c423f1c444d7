//! Command-line argument parsing for devpanel.

use crate::commands::ConnectArgs;
use clap::Parser;
use std::path::PathBuf;

/// Output format for headless mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One `[HH:MM:SS] LEVEL message` line per log entry.
    #[default]
    Text,
    /// JSON document with state, endpoint and entries.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!(
                "Invalid output format: {s}. Expected: text or json"
            )),
        }
    }
}

/// Terminal control panel for an HTTP-controlled embedded device.
#[derive(Parser, Debug)]
#[command(name = "devpanel")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Device host or IP address
    #[arg(short = 'H', long, value_name = "HOST")]
    pub host: Option<String>,

    /// Device port (defaults to 80, or 443 with --https)
    #[arg(short = 'p', long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Talk to the device over https
    #[arg(long)]
    pub https: bool,

    /// Request timeout in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// State database path (remembers the last device address)
    #[arg(long, value_name = "PATH")]
    pub state: Option<PathBuf>,

    /// Do not read or write the saved device address
    #[arg(long)]
    pub no_persist: bool,

    // === Headless mode options ===
    /// Run in headless mode (no terminal UI, for scripting)
    #[arg(long)]
    pub headless: bool,

    /// Use an in-memory mock device (every route answers 200 "OK")
    #[arg(long)]
    pub mock_device: bool,

    /// Semicolon-separated commands to run in headless mode (e.g., "connect 10.0.0.2; led on").
    /// A quoted ';' does not split
    #[arg(long, value_name = "COMMANDS")]
    pub exec: Option<String>,

    /// Path to a script file with one command per line (use "-" for stdin)
    #[arg(long, value_name = "PATH")]
    pub script: Option<String>,

    /// Output format for headless mode
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub output: String,

    /// Write output to file instead of stdout
    #[arg(long, value_name = "PATH")]
    pub output_file: Option<PathBuf>,

    /// Stop at the first command that fails
    #[arg(long)]
    pub fail_fast: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::Config::default_path)
    }

    /// Endpoint overrides given on the command line.
    pub fn connect_args(&self) -> ConnectArgs {
        ConnectArgs {
            host: self.host.clone(),
            port: self.port.map(|p| p.to_string()),
            secure: self.https.then_some(true),
        }
    }

    /// Returns true if headless mode is enabled.
    pub fn is_headless(&self) -> bool {
        self.headless
    }

    /// Parses the output format from the --output argument.
    pub fn parse_output_format(&self) -> std::result::Result<OutputFormat, String> {
        self.output.parse()
    }

    /// Validates headless mode arguments.
    /// Returns an error message if validation fails.
    pub fn validate_headless(&self) -> std::result::Result<(), String> {
        if !self.headless {
            return Ok(());
        }

        if self.exec.is_none() && self.script.is_none() {
            return Err("--headless requires --exec or --script".to_string());
        }

        if self.exec.is_some() && self.script.is_some() {
            return Err("--exec and --script cannot be combined".to_string());
        }

        if self.timeout_ms == Some(0) {
            return Err("--timeout-ms must be greater than zero".to_string());
        }

        self.parse_output_format()?;

        Ok(())
    }
}

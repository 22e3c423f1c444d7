//! Headless mode for scripting and automation.
//!
//! Runs a list of panel commands without a terminal, one after the other, then prints the
//! activity log as text or JSON.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::info;

use crate::activity::LogEntry;
use crate::app::{Flow, Panel};
use crate::cli::{Cli, OutputFormat};
use crate::commands::split_commands;
use crate::connection::ConnectionState;
use crate::error::{PanelError, Result};

/// Configuration for headless mode execution.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    pub output_format: OutputFormat,
    /// Stop at the first failing command.
    pub fail_fast: bool,
    /// Path to write output (None = stdout).
    pub output_file: Option<PathBuf>,
}

impl HeadlessConfig {
    /// Creates a HeadlessConfig from CLI arguments.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let output_format = cli.parse_output_format().map_err(PanelError::config)?;

        Ok(Self {
            output_format,
            fail_fast: cli.fail_fast,
            output_file: cli.output_file.clone(),
        })
    }
}

/// Result of headless execution.
#[derive(Debug, Clone, Serialize)]
pub struct HeadlessResult {
    pub state: ConnectionState,
    /// Base URL of the endpoint, or empty when no host is set.
    pub endpoint: String,
    pub commands_executed: usize,
    pub commands_failed: usize,
    pub duration_ms: u64,
    pub entries: Vec<LogEntry>,
}

/// Runs commands against a panel without a terminal.
pub struct HeadlessRunner {
    config: HeadlessConfig,
    panel: Panel,
    commands: Vec<String>,
}

impl HeadlessRunner {
    pub fn new(config: HeadlessConfig, panel: Panel) -> Self {
        Self {
            config,
            panel,
            commands: Vec::new(),
        }
    }

    /// Loads `;`-separated commands, as given to `--exec`. Quoted `;` do not split.
    pub fn load_commands(&mut self, input: &str) {
        self.commands = split_commands(input).into_iter().map(String::from).collect();
    }

    /// Loads one command per line. Blank lines and `#` comments are skipped.
    pub fn load_script_text(&mut self, content: &str) {
        self.commands = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(String::from)
            .collect();
    }

    /// Loads a script file; `-` reads stdin.
    pub fn load_script(&mut self, path: &str) -> Result<()> {
        let content = if path == "-" {
            use std::io::Read;
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| PanelError::internal(format!("Failed to read stdin: {e}")))?;
            buffer
        } else {
            std::fs::read_to_string(path)
                .map_err(|e| PanelError::internal(format!("Failed to read script file: {e}")))?
        };

        self.load_script_text(&content);
        Ok(())
    }

    /// Runs the loaded commands in order, awaiting each.
    pub async fn run(mut self) -> HeadlessResult {
        let start = Instant::now();
        let commands = std::mem::take(&mut self.commands);
        let mut executed = 0;
        let mut failed = 0;

        for command in &commands {
            info!("headless> {}", command);
            let flow = self.panel.run_line(command).await;
            executed += 1;

            match flow {
                Flow::Quit => break,
                Flow::Continue { ok: true } => {}
                Flow::Continue { ok: false } => {
                    failed += 1;
                    if self.config.fail_fast {
                        break;
                    }
                }
            }
        }

        self.snapshot(executed, failed, start.elapsed())
    }

    fn snapshot(&self, executed: usize, failed: usize, duration: Duration) -> HeadlessResult {
        let endpoint = self.panel.connection().endpoint();
        HeadlessResult {
            state: self.panel.state(),
            endpoint: if endpoint.is_specified() {
                endpoint.to_string()
            } else {
                String::new()
            },
            commands_executed: executed,
            commands_failed: failed,
            duration_ms: duration.as_millis() as u64,
            entries: self.panel.log().entries().cloned().collect(),
        }
    }
}

/// Formats headless results.
pub struct HeadlessOutput {
    format: OutputFormat,
}

impl HeadlessOutput {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self, result: &HeadlessResult) -> String {
        match self.format {
            OutputFormat::Text => Self::format_text(result),
            OutputFormat::Json => Self::format_json(result),
        }
    }

    fn format_text(result: &HeadlessResult) -> String {
        let mut out: String = result
            .entries
            .iter()
            .map(|e| format!("{}\n", e.display_line()))
            .collect();

        let failures = if result.commands_failed > 0 {
            format!(", {} failed", result.commands_failed)
        } else {
            String::new()
        };
        out.push_str(&format!(
            "Commands: {} executed in {}ms{} | State: {}\n",
            result.commands_executed,
            result.duration_ms,
            failures,
            result.state.label()
        ));
        out
    }

    fn format_json(result: &HeadlessResult) -> String {
        serde_json::to_string_pretty(result)
            .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize: {}\"}}", e))
    }
}

/// Runs headless mode from CLI arguments. Returns the process exit code.
pub async fn run_headless(cli: &Cli, panel: Panel) -> Result<i32> {
    cli.validate_headless().map_err(PanelError::config)?;

    let config = HeadlessConfig::from_cli(cli)?;
    let mut runner = HeadlessRunner::new(config.clone(), panel);

    if let Some(ref commands) = cli.exec {
        runner.load_commands(commands);
    } else if let Some(ref script_path) = cli.script {
        runner.load_script(script_path)?;
    }

    let result = runner.run().await;
    let output_str = HeadlessOutput::new(config.output_format).format(&result);

    if let Some(ref path) = config.output_file {
        std::fs::write(path, &output_str)
            .map_err(|e| PanelError::internal(format!("Failed to write output file: {e}")))?;
    } else {
        print!("{}", output_str);
    }

    Ok(if result.commands_failed > 0 { 1 } else { 0 })
}

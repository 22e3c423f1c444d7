//! devpanel - a terminal control panel for an HTTP-controlled embedded device.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use devpanel::app::Panel;
use devpanel::cli::Cli;
use devpanel::config::Config;
use devpanel::device::{Fetcher, HttpTransport, HttpTransportConfig, MockTransport, Transport};
use devpanel::persistence::{KeyValueStore, MemoryStore, StateDb};
use devpanel::{headless, logging, tui};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse_args();

    if cli.is_headless() {
        logging::init_stderr_logging();
    } else {
        logging::init_file_logging();
    }

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    if cli.is_headless() {
        if let Err(msg) = cli.validate_headless() {
            bail!(msg);
        }
    }

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)
        .with_context(|| format!("Could not load {}", config_path.display()))?;
    config.device.apply_env_defaults();

    let timeout = Duration::from_millis(cli.timeout_ms.unwrap_or(config.request.timeout_ms));
    if timeout.is_zero() {
        bail!("Request timeout must be greater than zero");
    }

    let transport: Arc<dyn Transport> = if cli.mock_device {
        info!("Using the in-memory mock device");
        Arc::new(MockTransport::new())
    } else {
        Arc::new(
            HttpTransport::with_config(HttpTransportConfig {
                accept_invalid_certs: config.request.accept_invalid_certs,
            })
            .context("Could not create the HTTP client")?,
        )
    };

    let (store, store_error) = open_store(&cli).await;

    let mut panel = Panel::new(Fetcher::new(transport, timeout), store)
        .with_endpoint(config.device.endpoint());
    if let Some(e) = store_error {
        panel.log_warning(format!(
            "Saved device address unavailable, continuing without it: {e}"
        ));
    }
    panel.restore().await;
    panel
        .apply_connect_args(&cli.connect_args())
        .context("Invalid device address on the command line")?;

    if cli.is_headless() {
        let code = headless::run_headless(&cli, panel).await?;
        return Ok(code);
    }

    panel.announce_startup(true);
    tui::run(&mut panel).await?;
    info!("devpanel exited");
    Ok(0)
}

/// Opens the state store. A store that cannot be opened is replaced by an in-memory one.
async fn open_store(cli: &Cli) -> (Arc<dyn KeyValueStore>, Option<String>) {
    if cli.no_persist {
        return (Arc::new(MemoryStore::new()), None);
    }

    let opened = match &cli.state {
        Some(path) => StateDb::open(path).await,
        None => StateDb::open_default().await,
    };

    match opened {
        Ok(db) => {
            info!("State database: {}", db.path().display());
            (Arc::new(db), None)
        }
        Err(e) => {
            warn!("Falling back to in-memory state: {e}");
            (Arc::new(MemoryStore::new()), Some(e.to_string()))
        }
    }
}

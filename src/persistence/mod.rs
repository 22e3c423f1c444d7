//! Persistence layer for devpanel.
//!
//! Durable key/value storage for the last-used device endpoint. The default backend is a
//! local SQLite database; an in-memory store is available for tests and `--no-persist`.

mod memory;
mod migrations;

pub use memory::{FailingStore, MemoryStore};

use crate::error::{PanelError, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Setting key for the device host.
pub const HOST_KEY: &str = "endpoint.host";
/// Setting key for the device port.
pub const PORT_KEY: &str = "endpoint.port";
/// Setting key for the "use https" flag (`"true"` / `"false"`).
pub const USE_HTTPS_KEY: &str = "endpoint.use_https";

const MAX_RETRY_ATTEMPTS: u32 = 3;
const RETRY_DELAY_MS: u64 = 100;

/// String key/value storage that survives restarts.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads a value; `None` when the key was never written.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Writes a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// SQLite-backed application state database.
pub struct StateDb {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl StateDb {
    /// Opens or creates the state database at the default platform path.
    ///
    /// - Linux/macOS: `~/.config/devpanel/state.db`
    /// - Windows: `%APPDATA%\devpanel\state.db`
    pub async fn open_default() -> Result<Self> {
        let path = Self::default_path()?;
        Self::open(&path).await
    }

    /// Opens or creates the state database at the specified path.
    pub async fn open(path: &Path) -> Result<Self> {
        Self::ensure_parent_dirs(path)?;

        match Self::try_open(path).await {
            Ok(db) => Ok(db),
            Err(e) => {
                warn!("Failed to open state database: {e}. Attempting recovery...");
                Self::attempt_recovery(path).await
            }
        }
    }

    /// Returns the default state database path for the current platform.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| PanelError::persistence("Could not determine config directory"))?;
        Ok(config_dir.join("devpanel").join("state.db"))
    }

    /// Attempts to open the database with retries for lock contention.
    async fn try_open(path: &Path) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRY_ATTEMPTS {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MS * 2u64.pow(attempt)))
                    .await;
            }

            match Self::connect(path).await {
                Ok(pool) => {
                    migrations::run_migrations(&pool).await?;
                    info!("State database opened at {}", path.display());
                    return Ok(Self {
                        pool,
                        db_path: path.to_path_buf(),
                    });
                }
                Err(e) => {
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| PanelError::persistence("Failed to open database after retries")))
    }

    /// Creates a connection pool to the SQLite database.
    async fn connect(path: &Path) -> Result<SqlitePool> {
        let conn_str = format!("sqlite:{}?mode=rwc", path.display());
        let options = SqliteConnectOptions::from_str(&conn_str)
            .map_err(|e| PanelError::persistence(format!("Invalid database path: {e}")))?
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .create_if_missing(true);

        SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(|e| {
                PanelError::persistence(format!("Failed to connect to state database: {e}"))
            })
    }

    /// Ensures parent directories exist for the database path.
    fn ensure_parent_dirs(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PanelError::persistence(format!(
                    "Failed to create config directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
        Ok(())
    }

    /// Attempts to recover from a corrupted database by backing up and recreating.
    async fn attempt_recovery(path: &Path) -> Result<Self> {
        let backup_path = path.with_extension("db.bak");

        if path.exists() {
            std::fs::rename(path, &backup_path).map_err(|e| {
                PanelError::persistence(format!(
                    "Failed to backup corrupted database to {}: {e}",
                    backup_path.display()
                ))
            })?;
            warn!("Backed up corrupted database to {}", backup_path.display());
        }

        Self::try_open(path).await.map_err(|e| {
            PanelError::persistence(format!("Failed to recreate database after backup: {e}"))
        })
    }

    /// Returns the path to the state database.
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Closes the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl KeyValueStore for StateDb {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PanelError::persistence(format!("Failed to read setting {key}: {e}")))?;

        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| PanelError::persistence(format!("Failed to write setting {key}: {e}")))?;

        Ok(())
    }
}

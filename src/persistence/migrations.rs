//! Schema versioning and migrations for the state database.
//!
//! Manages database schema evolution with forward-only migrations.

use crate::error::{PanelError, Result};
use sqlx::sqlite::SqlitePool;
use tracing::info;

const CURRENT_VERSION: i32 = 1;

/// Runs all pending migrations on the database.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    ensure_schema_versions_table(pool).await?;

    let current = get_current_version(pool).await?;

    if current > CURRENT_VERSION {
        return Err(PanelError::persistence(format!(
            "Database schema version ({}) is newer than supported version ({}). \
             Please upgrade devpanel to the latest version.",
            current, CURRENT_VERSION
        )));
    }

    if current < CURRENT_VERSION {
        info!(
            "Migrating state database from version {} to {}",
            current, CURRENT_VERSION
        );
        run_pending_migrations(pool, current).await?;
    }

    Ok(())
}

/// Ensures the schema_versions table exists.
async fn ensure_schema_versions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_versions (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| {
        PanelError::persistence(format!("Failed to create schema_versions table: {e}"))
    })?;

    Ok(())
}

/// Gets the current schema version (0 for a fresh database).
async fn get_current_version(pool: &SqlitePool) -> Result<i32> {
    let row: Option<(Option<i32>,)> = sqlx::query_as("SELECT MAX(version) FROM schema_versions")
        .fetch_optional(pool)
        .await
        .map_err(|e| PanelError::persistence(format!("Failed to get schema version: {e}")))?;

    Ok(row.and_then(|(v,)| v).unwrap_or(0))
}

/// Runs migrations from the current version to the target version.
async fn run_pending_migrations(pool: &SqlitePool, from_version: i32) -> Result<()> {
    for version in (from_version + 1)..=CURRENT_VERSION {
        run_migration(pool, version).await?;
        record_version(pool, version).await?;
        info!("Applied migration v{}", version);
    }
    Ok(())
}

/// Records a completed migration version.
async fn record_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT INTO schema_versions (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await
        .map_err(|e| PanelError::persistence(format!("Failed to record migration: {e}")))?;
    Ok(())
}

/// Runs a specific migration version.
async fn run_migration(pool: &SqlitePool, version: i32) -> Result<()> {
    match version {
        1 => migration_v1(pool).await,
        _ => Err(PanelError::persistence(format!(
            "Unknown migration version: {version}"
        ))),
    }
}

/// Migration v1: key/value settings table.
async fn migration_v1(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| PanelError::persistence(format!("Failed to create settings table: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_migrations_run_successfully() {
        let pool = test_pool().await;
        run_migrations(&pool).await.unwrap();

        let version = get_current_version(&pool).await.unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = test_pool().await;

        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let version = get_current_version(&pool).await.unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[tokio::test]
    async fn test_newer_schema_is_rejected() {
        let pool = test_pool().await;
        run_migrations(&pool).await.unwrap();
        record_version(&pool, CURRENT_VERSION + 1).await.unwrap();

        let err = run_migrations(&pool).await.unwrap_err();
        assert!(err.to_string().contains("newer than supported"));
    }

    #[tokio::test]
    async fn test_tables_created() {
        let pool = test_pool().await;
        run_migrations(&pool).await.unwrap();

        let tables: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
                .fetch_all(&pool)
                .await
                .unwrap();

        let table_names: Vec<&str> = tables.iter().map(|(n,)| n.as_str()).collect();
        assert!(table_names.contains(&"settings"));
        assert!(table_names.contains(&"schema_versions"));
    }
}

//! Database access layer for perfmap-server
//!
//! A single `performances` table in SQLite, accessed through a sqlx pool.

use perfmap_common::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod performances;

/// Open (creating if missing) the database and ensure the schema exists
pub async fn init_database(db_path: &Path, max_connections: u32) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_performances_table(&pool).await?;

    Ok(pool)
}

/// Create the performances table (idempotent)
pub async fn create_performances_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS performances (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            artist TEXT NOT NULL CHECK (length(trim(artist)) > 0),
            type TEXT NOT NULL CHECK (length(trim(type)) > 0),
            province TEXT NOT NULL CHECK (length(trim(province)) > 0),
            city TEXT,
            venue TEXT,
            notes TEXT,
            date TEXT,
            poster TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_performances_created_at ON performances(created_at)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_performances_province ON performances(province)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_performances_artist ON performances(artist)")
        .execute(pool)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_database_creation_when_missing() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("sub").join("perfmap.db");

        let pool = init_database(&db_path, 2).await.unwrap();
        assert!(db_path.exists(), "Database file was not created");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM performances")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_database_opens_existing() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("perfmap.db");

        let pool1 = init_database(&db_path, 2).await.unwrap();
        pool1.close().await;

        let pool2 = init_database(&db_path, 2).await;
        assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());
    }

    #[tokio::test]
    async fn test_required_columns_reject_blank_values() {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_database(&temp_dir.path().join("perfmap.db"), 1).await.unwrap();

        let result = sqlx::query(
            "INSERT INTO performances (artist, type, province, created_at) VALUES ('  ', 'concert', '浙江省', '2024-01-01T00:00:00Z')",
        )
        .execute(&pool)
        .await;
        assert!(result.is_err());
    }
}

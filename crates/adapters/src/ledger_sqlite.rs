//! SQLite publication ledger

use async_trait::async_trait;
use phrasecast_domain::{LedgerError, PublicationLedger, PublishedRecord};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::path::Path;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

type LedgerRow = (
    String,
    String,
    Option<i64>,
    String,
    String,
    Option<String>,
    String,
    String,
);

/// SQLite-backed ledger; survives restarts
pub struct SqliteLedger {
    pool: SqlitePool,
}

impl SqliteLedger {
    /// Open the ledger database, creating it if needed
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| LedgerError::Database(format!("Failed to create directory: {}", e)))?;
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let ledger = Self { pool };
        ledger.run_migrations().await?;

        Ok(ledger)
    }

    /// Create an in-memory SQLite ledger (for testing)
    pub async fn in_memory() -> Result<Self, LedgerError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let ledger = Self { pool };
        ledger.run_migrations().await?;

        Ok(ledger)
    }

    async fn run_migrations(&self) -> Result<(), LedgerError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS published_artifacts (
                id TEXT PRIMARY KEY,
                artifact_name TEXT NOT NULL UNIQUE,
                sequence_index INTEGER,
                content_hash TEXT NOT NULL,
                remote_id TEXT NOT NULL,
                remote_url TEXT,
                caption TEXT NOT NULL,
                published_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        Ok(())
    }
}

fn from_row(row: LedgerRow) -> Result<PublishedRecord, LedgerError> {
    let (id, artifact_name, sequence_index, content_hash, remote_id, remote_url, caption, published_at) =
        row;

    let id = Uuid::parse_str(&id).map_err(|e| LedgerError::Serialization(e.to_string()))?;
    let published_at = OffsetDateTime::parse(&published_at, &Rfc3339)
        .map_err(|e| LedgerError::Serialization(e.to_string()))?;

    Ok(PublishedRecord {
        id,
        artifact_name,
        sequence_index: sequence_index.and_then(|i| u32::try_from(i).ok()),
        content_hash,
        remote_id,
        remote_url,
        caption,
        published_at,
    })
}

#[async_trait]
impl PublicationLedger for SqliteLedger {
    async fn is_published(&self, artifact_name: &str) -> Result<bool, LedgerError> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM published_artifacts WHERE artifact_name = ?")
                .bind(artifact_name)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| LedgerError::Database(e.to_string()))?;

        Ok(count.0 > 0)
    }

    async fn record_published(&self, record: &PublishedRecord) -> Result<(), LedgerError> {
        let published_at = record
            .published_at
            .format(&Rfc3339)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO published_artifacts
            (id, artifact_name, sequence_index, content_hash, remote_id, remote_url, caption, published_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(artifact_name) DO UPDATE SET
                content_hash = excluded.content_hash,
                remote_id = excluded.remote_id,
                remote_url = excluded.remote_url,
                caption = excluded.caption,
                published_at = excluded.published_at
            "#,
        )
        .bind(record.id.to_string())
        .bind(&record.artifact_name)
        .bind(record.sequence_index.map(i64::from))
        .bind(&record.content_hash)
        .bind(&record.remote_id)
        .bind(&record.remote_url)
        .bind(&record.caption)
        .bind(&published_at)
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<PublishedRecord>, LedgerError> {
        let rows: Vec<LedgerRow> = sqlx::query_as(
            r#"
            SELECT id, artifact_name, sequence_index, content_hash, remote_id, remote_url, caption, published_at
            FROM published_artifacts
            ORDER BY published_at, rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        rows.into_iter().map(from_row).collect()
    }

    async fn reset(&self) -> Result<u64, LedgerError> {
        let result = sqlx::query("DELETE FROM published_artifacts")
            .execute(&self.pool)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }
}

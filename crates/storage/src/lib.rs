use sqlx::{migrate::MigrateError, sqlite::SqlitePoolOptions, SqlitePool};
use thiserror::Error;

use chrono::{DateTime, Utc};
use consult_intake_core::types::ConsultationRecord;

/// Top-level database handle that owns the SQLite connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Establishes a new SQLite connection pool for the provided connection string.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(StorageError::Connect)?;

        apply_pragmas(&pool).await?;

        Ok(Self { pool })
    }

    /// Applies migrations located under `migrations/`.
    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(StorageError::Migration)?;
        Ok(())
    }

    /// Returns a handle to operate on consultation records.
    pub fn consultations(&self) -> ConsultationRepository {
        ConsultationRepository {
            pool: self.pool.clone(),
        }
    }

    /// Exposes the inner pool when lower level access is required.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

async fn apply_pragmas(pool: &SqlitePool) -> Result<(), StorageError> {
    sqlx::query("PRAGMA foreign_keys = ON;")
        .execute(pool)
        .await
        .map_err(StorageError::Pragma)?;

    sqlx::query("PRAGMA journal_mode = WAL;")
        .fetch_one(pool)
        .await
        .map_err(StorageError::Pragma)?;

    sqlx::query("PRAGMA synchronous = NORMAL;")
        .execute(pool)
        .await
        .map_err(StorageError::Pragma)?;

    sqlx::query("PRAGMA busy_timeout = 5000;")
        .execute(pool)
        .await
        .map_err(StorageError::Pragma)?;

    Ok(())
}

/// General storage level errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to connect to sqlite: {0}")]
    Connect(sqlx::Error),
    #[error("failed to apply pragma: {0}")]
    Pragma(sqlx::Error),
    #[error("failed to run database migrations: {0}")]
    Migration(MigrateError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Repository responsible for the `consultations` table.
///
/// The table is insert only from the service's perspective; `id` and
/// `created_at` are filled in by SQLite and read back via `RETURNING`.
#[derive(Clone)]
pub struct ConsultationRepository {
    pool: SqlitePool,
}

impl ConsultationRepository {
    /// Inserts a new consultation and returns the stored row.
    pub async fn insert(
        &self,
        record: NewConsultation<'_>,
    ) -> Result<ConsultationRecord, ConsultationError> {
        let row = sqlx::query_as::<_, ConsultationRow>(
            "INSERT INTO consultations (name, contact, is_completed, click_source) \
             VALUES (?, ?, 0, ?) \
             RETURNING id, name, contact, is_completed, click_source, created_at",
        )
        .bind(record.name)
        .bind(record.contact)
        .bind(record.click_source)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_domain())
    }
}

/// Data required to create a new row in `consultations`.
///
/// `click_source` arrives already defaulted; the column itself is NOT NULL.
pub struct NewConsultation<'a> {
    pub name: &'a str,
    pub contact: &'a str,
    pub click_source: &'a str,
}

/// Raw `consultations` row as read back from SQLite.
#[derive(Debug, sqlx::FromRow)]
struct ConsultationRow {
    id: i64,
    name: String,
    contact: String,
    is_completed: i64,
    click_source: String,
    created_at: DateTime<Utc>,
}

impl ConsultationRow {
    fn into_domain(self) -> ConsultationRecord {
        ConsultationRecord {
            id: self.id,
            name: self.name,
            contact: self.contact,
            is_completed: self.is_completed != 0,
            click_source: self.click_source,
            created_at: self.created_at,
        }
    }
}

/// Errors that can occur while writing consultation records.
#[derive(Debug, Error)]
pub enum ConsultationError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

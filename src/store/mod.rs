//! SQLite persistence. The tables and the uniqueness guarantees the rest of
//! the system leans on live here; every write publishes to the change feed
//! after it commits.

pub mod messages;
pub mod participations;
pub mod posts;
pub mod profiles;

use sqlx::SqlitePool;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store failures, classified the way call sites tell them apart:
/// `Conflict` is the already-exists case that participation tracking and
/// registration handle specially, `NotFound` drives the not-found views,
/// and `Io` is everything transient.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("row not found")]
    NotFound,
    #[error("unique constraint violated")]
    Conflict,
    #[error(transparent)]
    Io(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db)
                if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation) =>
            {
                StoreError::Conflict
            }
            _ => StoreError::Io(err),
        }
    }
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict)
    }
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS profiles (
    id TEXT PRIMARY KEY,
    student_id TEXT NOT NULL UNIQUE,
    nickname TEXT NOT NULL,
    gender TEXT NOT NULL,
    icon TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS posts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    nickname TEXT NOT NULL,
    icon TEXT NOT NULL,
    activity TEXT NOT NULL,
    category TEXT NOT NULL,
    time TEXT NOT NULL,
    location TEXT,
    expiration_date TEXT,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS participations (
    user_id TEXT NOT NULL,
    post_id INTEGER NOT NULL,
    PRIMARY KEY (user_id, post_id)
);
CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    post_id INTEGER NOT NULL,
    user_id TEXT NOT NULL,
    nickname TEXT NOT NULL,
    icon TEXT NOT NULL,
    message TEXT NOT NULL,
    created_at TEXT NOT NULL
);
";

/// Create the tables and constraints. Idempotent.
pub async fn init(pool: &SqlitePool) -> StoreResult<()> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}

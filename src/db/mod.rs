//! Database module for SQLite persistence of assessment sessions

pub mod models;
pub mod repository;

use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Create a new database connection pool
///
/// In-memory databases exist per connection, so they get a single one.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, DbError> {
    let max_connections = if database_url.contains(":memory:") {
        1
    } else {
        5
    };

    tracing::debug!(
        database_url = %database_url,
        max_connections = max_connections,
        "Connecting to SQLite"
    );

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    tracing::info!(database_url = %database_url, "SQLite connection established");

    Ok(pool)
}

/// Initialize database schema
pub async fn init_schema(pool: &SqlitePool) -> Result<(), DbError> {
    // seq keeps insertion order for the manager view
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS assessments (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            user_name TEXT NOT NULL,
            application TEXT NOT NULL,
            self_ratings TEXT NOT NULL DEFAULT '[]',
            generated_questions TEXT NOT NULL DEFAULT '[]',
            answers TEXT NOT NULL DEFAULT '[]',
            correct_count INTEGER,
            total_count INTEGER,
            percentage REAL,
            state TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_assessments_application ON assessments(application)",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_assessments_state ON assessments(state)")
        .execute(pool)
        .await?;

    tracing::info!("Database schema initialized");

    Ok(())
}

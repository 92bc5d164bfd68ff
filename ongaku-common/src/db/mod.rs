//! SQLite storage for the Ongaku corpus
//!
//! One database holds everything derived from the music library: song
//! locations and tag metadata, per-song cepstra, and named manifold
//! embeddings. All stages share the pool.

pub mod cepstra;
pub mod manifolds;
pub mod songs;

use crate::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize the database connection pool, creating the file and schema
/// on first use.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// In-memory pool for tests and throwaway corpora
pub async fn init_memory_pool() -> Result<SqlitePool> {
    let pool = SqlitePool::connect("sqlite::memory:").await?;
    init_tables(&pool).await?;
    Ok(pool)
}

/// Create tables if they don't exist
async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS songs (
            tag TEXT PRIMARY KEY,
            location TEXT NOT NULL,
            artist TEXT NOT NULL,
            album TEXT NOT NULL,
            title TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cepstra (
            tag TEXT PRIMARY KEY REFERENCES songs(tag),
            bands INTEGER NOT NULL,
            frames INTEGER NOT NULL,
            samples TEXT NOT NULL,
            window_seconds REAL NOT NULL,
            min_frequency REAL NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS manifolds (
            name TEXT NOT NULL,
            position INTEGER NOT NULL,
            tag TEXT NOT NULL,
            coords TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (name, tag)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

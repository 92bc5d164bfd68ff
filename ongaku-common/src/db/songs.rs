//! Song location and tag persistence
//!
//! The songs table is the tag -> file location reference used when a
//! playlist of tags is resolved back to playable files.

use crate::tags::CorpusTag;
use crate::Result;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;

/// One scanned library entry
#[derive(Debug, Clone)]
pub struct SongRecord {
    pub tag: CorpusTag,
    pub location: String,
}

/// Insert or refresh a song's location
pub async fn save_song(pool: &SqlitePool, song: &SongRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO songs (tag, location, artist, album, title)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(tag) DO UPDATE SET
            location = excluded.location,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(song.tag.key())
    .bind(&song.location)
    .bind(&song.tag.artist)
    .bind(&song.tag.album)
    .bind(&song.tag.title)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load the file location for one tag key
pub async fn load_location(pool: &SqlitePool, tag: &str) -> Result<Option<String>> {
    let row = sqlx::query("SELECT location FROM songs WHERE tag = ?")
        .bind(tag)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| r.get::<String, _>("location")))
}

/// Load the complete tag -> location reference map
pub async fn load_locations(pool: &SqlitePool) -> Result<HashMap<String, String>> {
    let rows = sqlx::query("SELECT tag, location FROM songs")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|r| (r.get::<String, _>("tag"), r.get::<String, _>("location")))
        .collect())
}

/// All tag keys currently known, sorted
pub async fn load_tags(pool: &SqlitePool) -> Result<Vec<String>> {
    let rows = sqlx::query("SELECT tag FROM songs ORDER BY tag")
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(|r| r.get::<String, _>("tag")).collect())
}

//! M3U rendering
//!
//! Playlists leave the system as plain M3U files: one resolved file
//! location per line, in playlist order. Locations come from the song
//! table, so a playlist can only be rendered for songs that went through
//! the analysis stage.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use sqlx::SqlitePool;
use tracing::info;

use ongaku_common::db::songs;
use ongaku_common::{Error, Result};

use crate::shapes::Playlist;

/// Render a playlist against a tag-to-location map
pub fn render(playlist: &Playlist, locations: &HashMap<String, String>) -> Result<String> {
    let mut lines = Vec::with_capacity(playlist.len());
    for tag in &playlist.tags {
        let location = locations
            .get(tag)
            .ok_or_else(|| Error::NotFound(format!("no stored location for {tag}")))?;
        lines.push(location.as_str());
    }
    let mut content = lines.join("\n");
    content.push('\n');
    Ok(content)
}

/// Resolve locations from the database and write `<dir>/<name>.m3u`
pub async fn write_playlist(
    pool: &SqlitePool,
    dir: &Path,
    playlist: &Playlist,
) -> Result<PathBuf> {
    let locations = songs::load_locations(pool).await?;
    let content = render(playlist, &locations)?;

    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.m3u", playlist.name));
    std::fs::write(&path, content)?;
    info!(path = %path.display(), songs = playlist.len(), "playlist written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playlist() -> Playlist {
        Playlist {
            name: "line a to b".into(),
            tags: vec!["a".into(), "b".into()],
        }
    }

    #[test]
    fn renders_one_location_per_line() {
        let locations = HashMap::from([
            ("a".to_string(), "/music/a.flac".to_string()),
            ("b".to_string(), "/music/b.flac".to_string()),
        ]);
        let content = render(&playlist(), &locations).unwrap();
        assert_eq!(content, "/music/a.flac\n/music/b.flac\n");
    }

    #[test]
    fn missing_location_is_an_error() {
        let locations = HashMap::from([("a".to_string(), "/music/a.flac".to_string())]);
        assert!(matches!(
            render(&playlist(), &locations),
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn writes_the_file_under_the_playlist_name() {
        let pool = ongaku_common::db::init_memory_pool().await.unwrap();
        for tag in ["a", "b"] {
            sqlx::query(
                "INSERT INTO songs (tag, location, artist, album, title)
                 VALUES (?, ?, 'x', 'y', ?)",
            )
            .bind(tag)
            .bind(format!("/music/{tag}.flac"))
            .bind(tag)
            .execute(&pool)
            .await
            .unwrap();
        }

        let dir = tempfile::tempdir().unwrap();
        let path = write_playlist(&pool, dir.path(), &playlist()).await.unwrap();
        assert_eq!(path, dir.path().join("line a to b.m3u"));
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "/music/a.flac\n/music/b.flac\n");
    }
}

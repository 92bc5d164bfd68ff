//! Corpus tags: song identity within the corpus
//!
//! Every song is keyed throughout the system by its corpus tag, the string
//! `"{album artist} - {album} - {title}"` with filesystem-hostile characters
//! stripped. The learning metrics recover artist and album by splitting on
//! `" - "`, so those separators are load-bearing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Characters never allowed in a corpus tag (they would break the tag's use
/// as a storage key and a playlist-file stem).
const FORBIDDEN: &[char] = &['?', '*', ':', '"', '<', '>', '/', '|', '\\'];

/// Fallback album when a file carries no album tag
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

/// Fallback title when a file carries no title tag
pub const UNKNOWN_TRACK: &str = "Unknown Track";

/// Identity of one song in the corpus
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CorpusTag {
    /// Album artist (falls back to track artist at extraction time)
    pub artist: String,
    /// Album title
    pub album: String,
    /// Track title
    pub title: String,
}

impl CorpusTag {
    /// Build a tag from raw metadata fields, stripping forbidden characters
    pub fn new(artist: &str, album: &str, title: &str) -> Self {
        Self {
            artist: sanitize(artist),
            album: sanitize(album),
            title: sanitize(title),
        }
    }

    /// The canonical key string: `"artist - album - title"`
    pub fn key(&self) -> String {
        format!("{} - {} - {}", self.artist, self.album, self.title)
    }

    /// Parse a key back into its fields.
    ///
    /// The first two `" - "` separated fields are artist and album; the
    /// remainder (which may itself contain `" - "`) is the title. Returns
    /// None when fewer than three fields are present.
    pub fn parse(key: &str) -> Option<Self> {
        let mut parts = key.splitn(3, " - ");
        let artist = parts.next()?.to_string();
        let album = parts.next()?.to_string();
        let title = parts.next()?.to_string();
        Some(Self {
            artist,
            album,
            title,
        })
    }
}

impl fmt::Display for CorpusTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Remove characters that are invalid in tag keys and playlist file stems
fn sanitize(field: &str) -> String {
    field.chars().filter(|c| !FORBIDDEN.contains(c)).collect()
}

/// Strip the parts of a file name that are probably not the song title:
/// leading track numbers and punctuation, and the trailing extension.
pub fn song_name_from_file(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name);
    let start = base
        .find(|c: char| c.is_alphabetic())
        .unwrap_or(base.len());
    let trimmed = &base[start..];
    match trimmed.rfind('.') {
        Some(dot) => trimmed[..dot].to_string(),
        None => trimmed.to_string(),
    }
}

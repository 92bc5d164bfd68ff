//! Corpus tag extraction from audio file metadata
//!
//! Reads embedded tags with lofty and reduces them to the corpus tag
//! fields. The fallback chain: album artist, then track artist; a file
//! with neither cannot join the corpus. Album and title fall back to the
//! "Unknown" placeholders.

use lofty::file::TaggedFileExt;
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::{ItemKey, Tag};
use ongaku_common::tags::{CorpusTag, UNKNOWN_ALBUM, UNKNOWN_TRACK};
use std::path::Path;
use thiserror::Error;

/// Metadata extraction errors
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Failed to read or parse the file
    #[error("Failed to read file: {0}")]
    Read(String),

    /// No tags present at all
    #[error("No metadata found")]
    NoMetadata,

    /// Neither album artist nor artist tag present
    #[error("No artist in metadata")]
    NoArtist,
}

/// Corpus tag extractor
pub struct TagExtractor {}

impl TagExtractor {
    pub fn new() -> Self {
        Self {}
    }

    /// Extract the corpus tag from an audio file's embedded metadata
    pub fn extract(&self, file_path: &Path) -> Result<CorpusTag, MetadataError> {
        let tagged_file = Probe::open(file_path)
            .map_err(|e| MetadataError::Read(e.to_string()))?
            .read()
            .map_err(|e| MetadataError::Read(e.to_string()))?;

        let tag = tagged_file
            .primary_tag()
            .or_else(|| tagged_file.first_tag())
            .ok_or(MetadataError::NoMetadata)?;

        let artist = album_artist(tag)
            .or_else(|| tag.artist().map(|a| a.to_string()))
            .ok_or(MetadataError::NoArtist)?;
        let album = tag
            .album()
            .map(|a| a.to_string())
            .unwrap_or_else(|| UNKNOWN_ALBUM.to_string());
        let title = tag
            .title()
            .map(|t| t.to_string())
            .unwrap_or_else(|| UNKNOWN_TRACK.to_string());

        Ok(CorpusTag::new(&artist, &album, &title))
    }
}

impl Default for TagExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn album_artist(tag: &Tag) -> Option<String> {
    tag.get_string(&ItemKey::AlbumArtist)
        .map(|s| s.to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lofty::config::WriteOptions;
    use lofty::tag::{Accessor, TagExt, TagType};

    fn write_tagged_wav(path: &Path, artist: Option<&str>, album_artist: Option<&str>) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..800 {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let mut tag = Tag::new(TagType::Id3v2);
        if let Some(artist) = artist {
            tag.set_artist(artist.to_string());
        }
        if let Some(album_artist) = album_artist {
            tag.insert_text(ItemKey::AlbumArtist, album_artist.to_string());
        }
        tag.set_album("Dive".to_string());
        tag.set_title("A Walk".to_string());
        tag.save_to_path(path, WriteOptions::default()).unwrap();
    }

    #[test]
    fn album_artist_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.wav");
        write_tagged_wav(&path, Some("Tycho feat. Someone"), Some("Tycho"));

        let tag = TagExtractor::new().extract(&path).unwrap();
        assert_eq!(tag.artist, "Tycho");
        assert_eq!(tag.key(), "Tycho - Dive - A Walk");
    }

    #[test]
    fn artist_is_the_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.wav");
        write_tagged_wav(&path, Some("Tycho"), None);

        let tag = TagExtractor::new().extract(&path).unwrap();
        assert_eq!(tag.artist, "Tycho");
    }

    #[test]
    fn artistless_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.wav");
        write_tagged_wav(&path, None, None);

        let result = TagExtractor::new().extract(&path);
        assert!(matches!(result, Err(MetadataError::NoArtist)));
    }

    #[test]
    fn unreadable_files_error() {
        let result = TagExtractor::new().extract(Path::new("/nonexistent.flac"));
        assert!(matches!(result, Err(MetadataError::Read(_))));
    }
}

//! Batch preprocessing pipeline
//!
//! Scan a library, analyze every new song, and persist the cepstra. The
//! pipeline is idempotent: songs whose corpus tag already has a stored
//! cepstrum are not re-analyzed, so an interrupted run just resumes.
//! Their stored file location is still refreshed on every run, keeping
//! playlists valid after files move.
//!
//! Per-file failures (unreadable files, over-length songs, missing artist
//! tags) are logged and counted, never abort the batch.

use crate::cepstrum::{CepstrumAnalyzer, CepstrumConfig};
use crate::decoder;
use crate::metadata::TagExtractor;
use crate::scanner::LibraryScanner;
use ongaku_common::db::cepstra::{self, CepstrumParams};
use ongaku_common::db::songs::{self, SongRecord};
use ongaku_common::tags::CorpusTag;
use ongaku_common::{Cepstrum, Error, Result};
use rayon::prelude::*;
use regex::Regex;
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Outcome counts for one preprocessing run
#[derive(Debug, Clone, Default)]
pub struct PreprocessSummary {
    /// Audio files discovered by the scan
    pub scanned: usize,
    /// Songs newly analyzed and stored
    pub analyzed: usize,
    /// Songs skipped because a cepstrum already existed
    pub skipped: usize,
    /// Per-file failure descriptions
    pub failures: Vec<String>,
}

impl PreprocessSummary {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Library preprocessing pipeline
pub struct Preprocessor {
    config: CepstrumConfig,
    folder_filter: Option<Regex>,
}

impl Preprocessor {
    pub fn new(config: CepstrumConfig) -> Self {
        Self {
            config,
            folder_filter: None,
        }
    }

    /// Restrict preprocessing to top-level folders matching the regex
    pub fn with_folder_filter(mut self, filter: Regex) -> Self {
        self.folder_filter = Some(filter);
        self
    }

    /// Run the pipeline: scan, analyze new songs in parallel, persist.
    pub async fn run(&self, pool: &SqlitePool, library_root: &Path) -> Result<PreprocessSummary> {
        let mut scanner = LibraryScanner::new();
        if let Some(filter) = &self.folder_filter {
            scanner = scanner.with_folder_filter(filter.clone());
        }

        let files = scanner
            .scan(library_root)
            .map_err(|e| Error::Analysis(e.to_string()))?;
        info!("Scan found {} audio files", files.len());

        let mut summary = PreprocessSummary {
            scanned: files.len(),
            ..Default::default()
        };

        // Tag extraction and the skip check are cheap; do them up front so
        // the expensive analysis phase touches only new songs.
        let extractor = TagExtractor::new();
        let mut worklist: Vec<(PathBuf, CorpusTag)> = Vec::new();
        for file in files {
            match extractor.extract(&file) {
                Ok(tag) => {
                    if cepstra::has_cepstrum(pool, &tag.key()).await? {
                        debug!(tag = %tag, "Cepstrum already stored, skipping analysis");
                        // The file may have moved since the last run; the
                        // location must track every scan
                        let record = SongRecord {
                            location: file.to_string_lossy().to_string(),
                            tag,
                        };
                        songs::save_song(pool, &record).await?;
                        summary.skipped += 1;
                    } else {
                        worklist.push((file, tag));
                    }
                }
                Err(e) => {
                    warn!(file = %file.display(), "Metadata extraction failed: {}", e);
                    summary
                        .failures
                        .push(format!("{}: {}", file.display(), e));
                }
            }
        }

        info!("Analyzing {} new songs", worklist.len());

        // Decode + filterbank on the rayon pool, off the async runtime
        let analyzer = CepstrumAnalyzer::new(self.config);
        let results = tokio::task::spawn_blocking(move || analyze_batch(&analyzer, worklist))
            .await
            .map_err(|e| Error::Internal(format!("Analysis task panicked: {}", e)))?;

        let params = CepstrumParams {
            window_seconds: self.config.window_seconds,
            min_frequency: self.config.min_frequency,
        };
        for (path, tag, result) in results {
            match result {
                Ok(cepstrum) => {
                    let record = SongRecord {
                        location: path.to_string_lossy().to_string(),
                        tag: tag.clone(),
                    };
                    songs::save_song(pool, &record).await?;
                    cepstra::save_cepstrum(pool, &tag.key(), &cepstrum, params).await?;
                    summary.analyzed += 1;
                }
                Err(reason) => {
                    warn!(file = %path.display(), "Analysis failed: {}", reason);
                    summary.failures.push(format!("{}: {}", path.display(), reason));
                }
            }
        }

        info!(
            "Preprocessing complete: {} analyzed, {} skipped, {} failed",
            summary.analyzed,
            summary.skipped,
            summary.failed()
        );

        Ok(summary)
    }
}

/// Decode and analyze a batch of songs in parallel
fn analyze_batch(
    analyzer: &CepstrumAnalyzer,
    worklist: Vec<(PathBuf, CorpusTag)>,
) -> Vec<(PathBuf, CorpusTag, std::result::Result<Cepstrum, String>)> {
    worklist
        .into_par_iter()
        .map(|(path, tag)| {
            let result = decoder::decode_first_channel(&path)
                .map_err(|e| e.to_string())
                .and_then(|audio| analyzer.analyze(&audio).map_err(|e| e.to_string()));
            (path, tag, result)
        })
        .collect()
}

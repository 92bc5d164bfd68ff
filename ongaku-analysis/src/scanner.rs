//! Music library scanner
//!
//! Recursive audio file discovery with format verification. Two-phase:
//! sequential directory traversal with symlink-loop detection, then
//! parallel magic-byte verification of the candidates.
//!
//! An optional regex restricts the scan to top-level library folders whose
//! name matches at the start, which is how a corpus is carved out of a
//! large library (artist folders, label folders).

use rayon::prelude::*;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Library scanner errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Cannot access file
    #[error("File access error {0}: {1}")]
    FileAccess(PathBuf, String),
}

/// Scan result with statistics
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// Audio file paths found
    pub files: Vec<PathBuf>,
    /// Total size of all files in bytes
    pub total_size: u64,
    /// Count of files by extension
    pub by_format: HashMap<String, usize>,
}

/// Music library scanner
pub struct LibraryScanner {
    ignore_patterns: Vec<String>,
    folder_filter: Option<Regex>,
}

impl LibraryScanner {
    /// Create a scanner with default ignore patterns (system files and
    /// VCS directories)
    pub fn new() -> Self {
        Self {
            ignore_patterns: vec![
                ".DS_Store".to_string(),
                "Thumbs.db".to_string(),
                ".git".to_string(),
                ".svn".to_string(),
            ],
            folder_filter: None,
        }
    }

    /// Restrict the scan to top-level folders whose name matches the regex
    /// at its start
    pub fn with_folder_filter(mut self, filter: Regex) -> Self {
        self.folder_filter = Some(filter);
        self
    }

    /// Scan a library root for audio files
    pub fn scan(&self, root_path: &Path) -> Result<Vec<PathBuf>, ScanError> {
        if !root_path.exists() {
            return Err(ScanError::PathNotFound(root_path.to_path_buf()));
        }
        if !root_path.is_dir() {
            return Err(ScanError::NotADirectory(root_path.to_path_buf()));
        }

        let roots = self.filtered_roots(root_path)?;

        // Phase 1: sequential traversal. Must be sequential because the
        // symlink-loop set is mutable.
        let mut candidate_files = Vec::new();
        let mut symlink_visited = HashSet::new();

        for root in roots {
            let walker = WalkDir::new(&root)
                .follow_links(false)
                .into_iter()
                .filter_entry(|e| self.should_process_entry(e, &mut symlink_visited));

            for entry in walker {
                match entry {
                    Ok(entry) => {
                        if entry.file_type().is_file() {
                            candidate_files.push(entry.path().to_path_buf());
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Error accessing entry: {}", e);
                        // Continue scanning, don't abort
                    }
                }
            }
        }

        tracing::debug!(
            "Phase 1 complete: {} candidate files discovered",
            candidate_files.len()
        );

        // Phase 2: parallel magic-byte verification. Each thread reads a
        // different file.
        let mut audio_files: Vec<PathBuf> = candidate_files
            .par_iter()
            .filter_map(|path| match self.is_audio_file(path) {
                Ok(true) => Some(path.clone()),
                Ok(false) => None,
                Err(e) => {
                    tracing::warn!("Error verifying {}: {}", path.display(), e);
                    None
                }
            })
            .collect();
        audio_files.sort();

        tracing::debug!(
            "Phase 2 complete: {} audio files verified from {} candidates",
            audio_files.len(),
            candidate_files.len()
        );

        Ok(audio_files)
    }

    /// Scan with statistics
    pub fn scan_with_stats(&self, root_path: &Path) -> Result<ScanResult, ScanError> {
        let files = self.scan(root_path)?;

        let mut total_size = 0u64;
        let mut by_format = HashMap::new();

        for file in &files {
            if let Ok(metadata) = std::fs::metadata(file) {
                total_size += metadata.len();
            }
            if let Some(ext) = file.extension() {
                let ext_str = ext.to_string_lossy().to_lowercase();
                *by_format.entry(ext_str).or_insert(0) += 1;
            }
        }

        Ok(ScanResult {
            files,
            total_size,
            by_format,
        })
    }

    /// Resolve the folder filter to a set of walk roots
    fn filtered_roots(&self, root_path: &Path) -> Result<Vec<PathBuf>, ScanError> {
        let Some(filter) = &self.folder_filter else {
            return Ok(vec![root_path.to_path_buf()]);
        };

        let entries = std::fs::read_dir(root_path)
            .map_err(|e| ScanError::FileAccess(root_path.to_path_buf(), e.to_string()))?;

        let mut roots = Vec::new();
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let matches_at_start = filter
                .find(&name)
                .map(|m| m.start() == 0)
                .unwrap_or(false);
            if matches_at_start && entry.path().is_dir() {
                roots.push(entry.path());
            }
        }
        roots.sort();
        Ok(roots)
    }

    /// Check if entry should be processed
    fn should_process_entry(
        &self,
        entry: &DirEntry,
        symlink_visited: &mut HashSet<PathBuf>,
    ) -> bool {
        let path = entry.path();
        let file_name = entry.file_name().to_string_lossy();

        for pattern in &self.ignore_patterns {
            if file_name.contains(pattern) {
                return false;
            }
        }

        // Detect symlink loops
        if entry.file_type().is_symlink() {
            if let Ok(canonical) = path.canonicalize() {
                if !symlink_visited.insert(canonical) {
                    tracing::warn!("Symlink loop detected: {}", path.display());
                    return false;
                }
            }
        }

        true
    }

    /// Check if file is an audio format
    fn is_audio_file(&self, path: &Path) -> Result<bool, ScanError> {
        // Extension first (fast), then magic bytes (reliable)
        if let Some(ext) = path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if is_audio_extension(&ext_lower) {
                return self.verify_magic_bytes(path);
            }
        }

        Ok(false)
    }

    /// Verify file type using magic bytes
    fn verify_magic_bytes(&self, path: &Path) -> Result<bool, ScanError> {
        let mut file = File::open(path)
            .map_err(|e| ScanError::FileAccess(path.to_path_buf(), e.to_string()))?;

        let mut buffer = [0u8; 12];
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|e| ScanError::FileAccess(path.to_path_buf(), e.to_string()))?;

        if bytes_read < 4 {
            return Ok(false); // Too small to be audio
        }

        let is_audio = match &buffer[..bytes_read.min(12)] {
            // MP3
            [0xFF, 0xFB, ..] | [0xFF, 0xF3, ..] | [0xFF, 0xF2, ..] => true,
            [b'I', b'D', b'3', ..] => true, // MP3 with ID3 tag

            // FLAC
            [b'f', b'L', b'a', b'C', ..] => true,

            // OGG (Vorbis/Opus)
            [b'O', b'g', b'g', b'S', ..] => true,

            // M4A/AAC (MP4 container)
            [_, _, _, _, b'f', b't', b'y', b'p', ..] => true,

            // WAV
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'A', b'V', b'E'] => true,

            _ => false,
        };

        Ok(is_audio)
    }
}

impl Default for LibraryScanner {
    fn default() -> Self {
        Self::new()
    }
}

fn is_audio_extension(ext: &str) -> bool {
    matches!(
        ext,
        "mp3" | "flac" | "ogg" | "oga" | "m4a" | "aac" | "mp4" | "wav" | "opus"
    )
}

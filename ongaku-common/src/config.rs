//! Configuration loading and data folder resolution

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the Ongaku data folder
pub const DATA_FOLDER_ENV: &str = "ONGAKU_DATA";

/// Full pipeline configuration, one TOML section per stage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OngakuConfig {
    /// Music library root to scan for audio files
    pub library_root: Option<PathBuf>,

    pub analysis: AnalysisConfig,
    pub learning: LearningConfig,
    pub playlist: PlaylistConfig,
}

/// Cepstral analysis parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Number of gammatone quefrency bands
    pub bands: usize,
    /// Width of each time window in seconds (windows do not overlap)
    pub window_seconds: f64,
    /// Lowest gammatone centre frequency in Hz
    pub min_frequency: f64,
    /// Songs longer than this many seconds are skipped (memory guard)
    pub max_song_seconds: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            bands: 16,
            window_seconds: 1.0,
            min_frequency: 20.0,
            max_song_seconds: 1080.0,
        }
    }
}

/// Corpus shaping and manifold embedding parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Number of centre frames to crop each song to (must be even)
    pub crop_frames: usize,
    /// Pad songs shorter than the crop window instead of dropping them
    pub pad_short_songs: bool,
    /// PCA components ahead of Isomap; None skips the PCA stage
    pub pca_components: Option<usize>,
    /// Neighbourhood size for the Isomap graph
    pub isomap_neighbors: usize,
    /// Dimensionality of the embedded space
    pub n_components: usize,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            crop_frames: 120,
            pad_short_songs: true,
            pca_components: Some(100),
            isomap_neighbors: 5,
            // Empirically tuned embedding dimensionality
            n_components: 45,
        }
    }
}

/// Playlist geometry parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaylistConfig {
    /// Number of sample points along a drawn line (must be even)
    pub line_resolution: usize,
    /// Swept shapes keep growing until they hold at least this many songs
    pub min_length: usize,
    /// Radius increment per growth round
    pub growth_step: f64,
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            line_resolution: 100,
            min_length: 15,
            growth_step: 1.0,
        }
    }
}

impl OngakuConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Basic sanity checks on loaded values
    pub fn validate(&self) -> Result<()> {
        if self.analysis.bands == 0 {
            return Err(Error::Config("analysis.bands must be nonzero".to_string()));
        }
        if self.analysis.window_seconds <= 0.0 {
            return Err(Error::Config(
                "analysis.window_seconds must be positive".to_string(),
            ));
        }
        if self.learning.crop_frames % 2 != 0 {
            return Err(Error::Config(
                "learning.crop_frames must be even".to_string(),
            ));
        }
        if self.playlist.line_resolution % 2 != 0 {
            return Err(Error::Config(
                "playlist.line_resolution must be even".to_string(),
            ));
        }
        Ok(())
    }
}

/// Data folder resolution priority order:
/// 1. Explicit override (highest priority)
/// 2. Environment variable
/// 3. `data_folder` key in the platform config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_data_folder(override_path: Option<&Path>) -> PathBuf {
    if let Some(path) = override_path {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(DATA_FOLDER_ENV) {
        return PathBuf::from(path);
    }

    if let Some(config_path) = platform_config_file() {
        if let Ok(content) = std::fs::read_to_string(&config_path) {
            if let Ok(value) = toml::from_str::<toml::Value>(&content) {
                if let Some(folder) = value.get("data_folder").and_then(|v| v.as_str()) {
                    return PathBuf::from(folder);
                }
            }
        }
    }

    default_data_folder()
}

/// Path of the SQLite database inside a data folder
pub fn database_path(data_folder: &Path) -> PathBuf {
    data_folder.join("ongaku.db")
}

/// Platform configuration file location, if one exists
fn platform_config_file() -> Option<PathBuf> {
    let path = dirs::config_dir()?.join("ongaku").join("config.toml");
    path.exists().then_some(path)
}

/// OS-dependent default data folder
fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("ongaku"))
        .unwrap_or_else(|| PathBuf::from("./ongaku_data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_tuned_values() {
        let config = OngakuConfig::default();
        assert_eq!(config.analysis.bands, 16);
        assert_eq!(config.analysis.window_seconds, 1.0);
        assert_eq!(config.learning.n_components, 45);
        assert_eq!(config.playlist.line_resolution, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_partial_toml() {
        let config: OngakuConfig = toml::from_str(
            r#"
            [analysis]
            bands = 32

            [learning]
            n_components = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.analysis.bands, 32);
        assert_eq!(config.analysis.min_frequency, 20.0);
        assert_eq!(config.learning.n_components, 10);
        assert_eq!(config.playlist.min_length, 15);
    }

    #[test]
    fn odd_crop_length_fails_validation() {
        let mut config = OngakuConfig::default();
        config.learning.crop_frames = 121;
        assert!(config.validate().is_err());
    }

    #[test]
    fn explicit_override_wins() {
        let folder = resolve_data_folder(Some(Path::new("/tmp/ongaku-test")));
        assert_eq!(folder, PathBuf::from("/tmp/ongaku-test"));
    }

    #[test]
    fn loads_a_config_file_and_locates_the_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "library_root = \"/music\"\n\n[analysis]\nbands = 8\n",
        )
        .unwrap();

        let config = OngakuConfig::load(&path).unwrap();
        assert_eq!(config.library_root, Some(PathBuf::from("/music")));
        assert_eq!(config.analysis.bands, 8);
        assert_eq!(config.learning.n_components, 45);

        let db = database_path(&resolve_data_folder(Some(dir.path())));
        assert_eq!(db, dir.path().join("ongaku.db"));
    }
}

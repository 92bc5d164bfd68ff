//! The embedding pipeline
//!
//! Ties the learning stages together: crop and flatten the corpus,
//! robust-scale and clip the features, optionally reduce with PCA, embed
//! with Isomap, and persist the result as a named manifold.

use ndarray::Array2;
use sqlx::SqlitePool;
use tracing::{debug, info};

use ongaku_common::config::LearningConfig;
use ongaku_common::db::manifolds;
use ongaku_common::{Error, Manifold, Result};

use crate::corpus::Corpus;
use crate::isomap::{isomap, IsomapConfig};
use crate::pca::Pca;
use crate::scaling::{clip, nan_to_num, RobustScaler};

/// Decibel features are clipped to this range after scaling; wide silence
/// sentinels would otherwise dominate every distance
const CLIP_LOW: f64 = -1000.0;
const CLIP_HIGH: f64 = 5.0;

/// Embedding pipeline parameters
#[derive(Debug, Clone)]
pub struct EmbedderConfig {
    /// Number of centre frames each song is cropped to (must be even)
    pub crop_frames: usize,
    /// Pad songs shorter than the crop window instead of dropping them
    pub pad_short_songs: bool,
    /// PCA components ahead of Isomap; `None` skips the PCA stage
    pub pca_components: Option<usize>,
    /// Neighbourhood size for the Isomap graph
    pub isomap_neighbors: usize,
    /// Dimensionality of the embedded space
    pub n_components: usize,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self::from(&LearningConfig::default())
    }
}

impl From<&LearningConfig> for EmbedderConfig {
    fn from(config: &LearningConfig) -> Self {
        Self {
            crop_frames: config.crop_frames,
            pad_short_songs: config.pad_short_songs,
            pca_components: config.pca_components,
            isomap_neighbors: config.isomap_neighbors,
            n_components: config.n_components,
        }
    }
}

/// Turns a corpus of cepstra into a manifold
#[derive(Debug, Clone, Default)]
pub struct Embedder {
    config: EmbedderConfig,
}

impl Embedder {
    pub fn new(config: EmbedderConfig) -> Self {
        Self { config }
    }

    /// Embed a corpus into a metric space, one coordinate row per song
    pub fn embed(&self, corpus: &Corpus) -> Result<Manifold> {
        if corpus.is_empty() {
            return Err(Error::InvalidInput("cannot embed an empty corpus".into()));
        }

        let flat = corpus
            .cropped(self.config.crop_frames, self.config.pad_short_songs)?
            .flattened()?;
        debug!(
            songs = flat.len(),
            features = flat.matrix().ncols(),
            "corpus flattened"
        );

        let coords = self.embed_features(flat.matrix())?;
        Manifold::new(flat.tags().to_vec(), coords)
    }

    /// Embed and store under `name`, replacing any previous manifold of
    /// that name
    pub async fn embed_and_save(
        &self,
        pool: &SqlitePool,
        name: &str,
    ) -> Result<Manifold> {
        let corpus = Corpus::load(pool).await?;
        let manifold = self.embed(&corpus)?;
        manifolds::save_manifold(pool, name, &manifold).await?;
        info!(
            name,
            songs = manifold.len(),
            dimensions = manifold.n_components(),
            "manifold saved"
        );
        Ok(manifold)
    }

    fn embed_features(&self, features: &Array2<f64>) -> Result<Array2<f64>> {
        let mut scaled = RobustScaler::fit_transform(features);
        // Scaling a column whose IQR involves non-finite values can
        // reintroduce NaN; neutralize before clipping (clamp keeps NaN)
        scaled.mapv_inplace(nan_to_num);
        clip(&mut scaled, CLIP_LOW, CLIP_HIGH);

        let reduced = match self.config.pca_components {
            Some(n) => {
                let reduced = Pca::fit_transform(&scaled, n);
                debug!(components = reduced.ncols(), "pca applied");
                reduced
            }
            None => scaled,
        };

        let isomap_config = IsomapConfig {
            n_neighbors: self.config.isomap_neighbors,
            n_components: self.config.n_components,
        };
        isomap(&reduced, &isomap_config)
    }
}

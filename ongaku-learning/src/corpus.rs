//! Corpus assembly and shaping
//!
//! A corpus is the ordered collection of every song's cepstrum. Before
//! embedding, all matrices must share one frame count; `cropped` and
//! `padded` get them there. Padding uses `-inf` (the dB of zero power), so
//! padded frames read as silence.

use ndarray::{s, Array2};
use ongaku_common::db::cepstra;
use ongaku_common::{Cepstrum, Error, Result};
use sqlx::SqlitePool;
use std::collections::BTreeMap;

/// Ordered tag -> cepstrum collection
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    entries: BTreeMap<String, Cepstrum>,
}

impl Corpus {
    /// Build a corpus from (tag, cepstrum) pairs
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, Cepstrum)>) -> Self {
        Self {
            entries: pairs.into_iter().collect(),
        }
    }

    /// Load every stored cepstrum from the database
    pub async fn load(pool: &SqlitePool) -> Result<Self> {
        Ok(Self::from_pairs(cepstra::load_all(pool).await?))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tag keys in corpus order
    pub fn tags(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn get(&self, tag: &str) -> Option<&Cepstrum> {
        self.entries.get(tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Cepstrum)> {
        self.entries.iter()
    }

    /// Pad every song to the longest frame count with `-inf`
    pub fn padded(&self) -> Self {
        let longest = self
            .entries
            .values()
            .map(Cepstrum::frames)
            .max()
            .unwrap_or(0);

        let entries = self
            .entries
            .iter()
            .map(|(tag, cepstrum)| (tag.clone(), pad_frames(cepstrum, longest)))
            .collect();
        Self { entries }
    }

    /// Crop each song to its centre `target_frames` frames.
    ///
    /// `target_frames` must be even. Songs shorter than the target are
    /// `-inf`-padded when `pad_shorts` is set, otherwise dropped.
    pub fn cropped(&self, target_frames: usize, pad_shorts: bool) -> Result<Self> {
        if target_frames % 2 != 0 {
            return Err(Error::InvalidInput(
                "Crop length must be even".to_string(),
            ));
        }

        let mut entries = BTreeMap::new();
        for (tag, cepstrum) in &self.entries {
            let frames = cepstrum.frames();
            if frames >= target_frames {
                let start = frames / 2 - target_frames / 2;
                let cropped = cepstrum
                    .matrix()
                    .slice(s![.., start..start + target_frames])
                    .to_owned();
                entries.insert(tag.clone(), Cepstrum::new(cropped));
            } else if pad_shorts {
                entries.insert(tag.clone(), pad_frames(cepstrum, target_frames));
            }
            // Short songs are dropped when pad_shorts is off
        }
        Ok(Self { entries })
    }

    /// Flatten each matrix row-major into one feature vector.
    ///
    /// Requires a uniform shape across the corpus (crop or pad first).
    /// Values pass through `nan_to_num`, so `-inf` padding becomes the
    /// most negative finite value.
    pub fn flattened(&self) -> Result<FlatCorpus> {
        let mut shapes = self
            .entries
            .values()
            .map(|c| (c.bands(), c.frames()));
        let Some(shape) = shapes.next() else {
            return Err(Error::InvalidInput("Corpus is empty".to_string()));
        };
        if shapes.any(|s| s != shape) {
            return Err(Error::InvalidInput(
                "Corpus has mixed shapes; crop or pad before flattening".to_string(),
            ));
        }

        let (bands, frames) = shape;
        let n_features = bands * frames;
        let mut matrix = Array2::zeros((self.entries.len(), n_features));
        let mut tags = Vec::with_capacity(self.entries.len());
        for (row, (tag, cepstrum)) in self.entries.iter().enumerate() {
            tags.push(tag.clone());
            for (col, &value) in cepstrum.matrix().iter().enumerate() {
                matrix[[row, col]] = crate::scaling::nan_to_num(value);
            }
        }

        Ok(FlatCorpus { tags, matrix })
    }
}

/// Flattened corpus: one feature row per song
#[derive(Debug, Clone)]
pub struct FlatCorpus {
    tags: Vec<String>,
    matrix: Array2<f64>,
}

impl FlatCorpus {
    pub fn new(tags: Vec<String>, matrix: Array2<f64>) -> Result<Self> {
        if tags.len() != matrix.nrows() {
            return Err(Error::InvalidInput(format!(
                "{} tags for {} feature rows",
                tags.len(),
                matrix.nrows()
            )));
        }
        Ok(Self { tags, matrix })
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }
}

fn pad_frames(cepstrum: &Cepstrum, target: usize) -> Cepstrum {
    let bands = cepstrum.bands();
    let frames = cepstrum.frames();
    if frames >= target {
        return cepstrum.clone();
    }
    let mut padded = Array2::from_elem((bands, target), f64::NEG_INFINITY);
    padded
        .slice_mut(s![.., ..frames])
        .assign(cepstrum.matrix());
    Cepstrum::new(padded)
}

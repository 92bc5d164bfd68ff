//! Gammatone cepstrum matrix type
//!
//! A cepstrum is a `bands x frames` matrix of decibel values: rows are
//! ERB-spaced gammatone bands, columns are fixed-width time windows. Silent
//! windows carry `-inf` (10*log10 of zero power), never NaN.

use crate::{Error, Result};
use ndarray::Array2;

/// Per-song gammatone cepstrum in decibels
#[derive(Debug, Clone, PartialEq)]
pub struct Cepstrum {
    data: Array2<f64>,
}

impl Cepstrum {
    /// Wrap a `bands x frames` dB matrix
    pub fn new(data: Array2<f64>) -> Self {
        Self { data }
    }

    /// Rebuild from a flat row-major sample vector
    pub fn from_samples(bands: usize, frames: usize, samples: Vec<f64>) -> Result<Self> {
        let data = Array2::from_shape_vec((bands, frames), samples).map_err(|e| {
            Error::InvalidInput(format!(
                "Cepstrum shape {}x{} does not match sample count: {}",
                bands, frames, e
            ))
        })?;
        Ok(Self { data })
    }

    /// Number of gammatone bands (rows)
    pub fn bands(&self) -> usize {
        self.data.nrows()
    }

    /// Number of time windows (columns)
    pub fn frames(&self) -> usize {
        self.data.ncols()
    }

    /// Borrow the underlying matrix
    pub fn matrix(&self) -> &Array2<f64> {
        &self.data
    }

    /// Consume into the underlying matrix
    pub fn into_matrix(self) -> Array2<f64> {
        self.data
    }

    /// Row-major flat copy of the samples (storage layout)
    pub fn to_samples(&self) -> Vec<f64> {
        self.data.iter().copied().collect()
    }
}

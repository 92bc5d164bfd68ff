//! Embedded metric space of songs
//!
//! The manifold is the output of the embedding stage: one low-dimensional
//! coordinate row per song, keyed by corpus tag. Distances between rows are
//! Euclidean; the playlist geometry engine operates entirely on this type.

use crate::{Error, Result};
use ndarray::{Array2, ArrayView1};
use std::collections::HashMap;

/// Songs embedded in a low-dimensional metric space
#[derive(Debug, Clone)]
pub struct Manifold {
    tags: Vec<String>,
    coords: Array2<f64>,
    index: HashMap<String, usize>,
}

impl Manifold {
    /// Build a manifold from tag keys and an `n_songs x n_components`
    /// coordinate matrix. Tag order must match row order.
    pub fn new(tags: Vec<String>, coords: Array2<f64>) -> Result<Self> {
        if tags.len() != coords.nrows() {
            return Err(Error::InvalidInput(format!(
                "Manifold has {} tags but {} coordinate rows",
                tags.len(),
                coords.nrows()
            )));
        }
        let index = tags
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        Ok(Self {
            tags,
            coords,
            index,
        })
    }

    /// Number of songs in the space
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// True when the space holds no songs
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Dimensionality of the embedding
    pub fn n_components(&self) -> usize {
        self.coords.ncols()
    }

    /// Tag keys in row order
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Coordinate matrix, `len() x n_components()`
    pub fn coords(&self) -> &Array2<f64> {
        &self.coords
    }

    /// Row index of a tag key
    pub fn index_of(&self, tag: &str) -> Option<usize> {
        self.index.get(tag).copied()
    }

    /// Coordinates of one song
    pub fn position(&self, tag: &str) -> Option<ArrayView1<'_, f64>> {
        self.index_of(tag).map(|i| self.coords.row(i))
    }

    /// Euclidean distance between two rows
    pub fn distance(&self, a: usize, b: usize) -> f64 {
        let diff = &self.coords.row(a) - &self.coords.row(b);
        diff.dot(&diff).sqrt()
    }
}

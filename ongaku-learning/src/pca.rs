//! Principal component analysis by power iteration
//!
//! Dependency-free PCA: centre the data, then find principal directions
//! one at a time with power iteration on the implicit covariance (each
//! step multiplies by X then Xᵀ, never forming the covariance matrix),
//! deflating by Gram-Schmidt against the components already found. The
//! deterministic seeding makes runs reproducible.

use ndarray::{Array1, Array2};

const POWER_ITERATIONS: usize = 50;
const NORM_FLOOR: f64 = 1e-10;

/// Fitted PCA transform
#[derive(Debug, Clone)]
pub struct Pca {
    mean: Array1<f64>,
    /// `n_components x n_features`, orthonormal rows
    components: Array2<f64>,
}

impl Pca {
    /// Fit `n_components` principal directions (clamped to the rank bound
    /// `min(n_samples, n_features)`)
    pub fn fit(data: &Array2<f64>, n_components: usize) -> Self {
        let n_samples = data.nrows();
        let n_features = data.ncols();
        let n_components = n_components.min(n_samples).min(n_features);

        let mean = data
            .mean_axis(ndarray::Axis(0))
            .unwrap_or_else(|| Array1::zeros(n_features));
        let mut centered = data.clone();
        for mut row in centered.rows_mut() {
            row -= &mean;
        }

        let mut components = Array2::zeros((n_components, n_features));
        for comp in 0..n_components {
            let mut v = seeded_direction(n_features, comp as u64);
            orthogonalize(&mut v, &components, comp);
            normalize(&mut v);

            for _ in 0..POWER_ITERATIONS {
                // v <- Xᵀ (X v), projected away from found components
                let projected = centered.dot(&v);
                let mut next = centered.t().dot(&projected);
                orthogonalize(&mut next, &components, comp);
                if !normalize(&mut next) {
                    break; // rank exhausted
                }
                v = next;
            }

            components.row_mut(comp).assign(&v);
        }

        Self { mean, components }
    }

    /// Project data onto the fitted components
    pub fn transform(&self, data: &Array2<f64>) -> Array2<f64> {
        let mut centered = data.clone();
        for mut row in centered.rows_mut() {
            row -= &self.mean;
        }
        centered.dot(&self.components.t())
    }

    /// Fit and project in one step
    pub fn fit_transform(data: &Array2<f64>, n_components: usize) -> Array2<f64> {
        Self::fit(data, n_components).transform(data)
    }

    pub fn n_components(&self) -> usize {
        self.components.nrows()
    }
}

/// Deterministic start vector for power iteration.
///
/// Uses an xorshift sequence per element: the entries carry no linear
/// structure, so the vector cannot sit exactly orthogonal to a patterned
/// eigenvector (a linear ramp would, and power iteration never escapes
/// the orthogonal complement it starts in).
pub(crate) fn seeded_direction(len: usize, seed: u64) -> Array1<f64> {
    let mut state = 0x9E37_79B9_7F4A_7C15u64 ^ seed.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    Array1::from_iter((0..len).map(|_| {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (state >> 11) as f64 / (1u64 << 53) as f64 - 0.5
    }))
}

/// Remove the projections onto the first `count` rows of `basis`
fn orthogonalize(v: &mut Array1<f64>, basis: &Array2<f64>, count: usize) {
    for i in 0..count {
        let row = basis.row(i);
        let dot = v.dot(&row);
        v.zip_mut_with(&row.to_owned(), |a, &b| *a -= dot * b);
    }
}

/// Scale to unit norm; false when the vector has collapsed
fn normalize(v: &mut Array1<f64>) -> bool {
    let norm = v.dot(v).sqrt();
    if norm > NORM_FLOOR {
        *v /= norm;
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn column_variance(data: &Array2<f64>, col: usize) -> f64 {
        let column = data.column(col);
        let mean = column.mean().unwrap();
        column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / column.len() as f64
    }

    #[test]
    fn first_component_captures_the_dominant_axis() {
        // Points spread widely along one diagonal, barely across it
        let data = array![
            [0.0, 0.0],
            [1.0, 1.01],
            [2.0, 1.99],
            [3.0, 3.02],
            [4.0, 3.98],
            [5.0, 5.0],
        ];
        let transformed = Pca::fit_transform(&data, 2);
        assert_eq!(transformed.ncols(), 2);
        assert!(column_variance(&transformed, 0) > 100.0 * column_variance(&transformed, 1));
    }

    #[test]
    fn full_rank_projection_preserves_distances() {
        let data = array![
            [1.0, 2.0, 0.5],
            [4.0, 0.0, 2.5],
            [2.0, 3.0, 1.0],
            [0.0, 1.0, 4.0],
        ];
        let transformed = Pca::fit_transform(&data, 3);

        let dist = |m: &Array2<f64>, i: usize, j: usize| -> f64 {
            let diff = &m.row(i) - &m.row(j);
            diff.dot(&diff).sqrt()
        };
        for i in 0..4 {
            for j in (i + 1)..4 {
                assert!(
                    (dist(&data, i, j) - dist(&transformed, i, j)).abs() < 1e-6,
                    "distance {}-{} not preserved",
                    i,
                    j
                );
            }
        }
    }

    #[test]
    fn patterned_principal_axis_is_recovered() {
        // All variance lies along (1,-1,-1,1). A start vector with linear
        // structure across the features is exactly orthogonal to this axis
        // and power iteration would zero the component out.
        let axis = [1.0, -1.0, -1.0, 1.0];
        let mut data = Array2::zeros((4, 4));
        for (row, t) in [-3.0f64, -1.0, 1.0, 3.0].iter().enumerate() {
            for (col, a) in axis.iter().enumerate() {
                data[[row, col]] = t * a;
            }
        }
        let transformed = Pca::fit_transform(&data, 1);
        assert_eq!(transformed.ncols(), 1);
        // projections keep the spacing: |t_max - t_min| * |axis| = 6 * 2
        let spread = (transformed[[3, 0]] - transformed[[0, 0]]).abs();
        assert!((spread - 12.0).abs() < 1e-6, "spread was {}", spread);
    }

    #[test]
    fn component_count_is_clamped_to_rank_bound() {
        let data = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let pca = Pca::fit(&data, 10);
        assert_eq!(pca.n_components(), 2);
        assert_eq!(pca.transform(&data).ncols(), 2);
    }

    #[test]
    fn components_are_orthonormal() {
        let data = array![
            [1.0, 0.0, 2.0],
            [0.0, 3.0, 1.0],
            [2.0, 1.0, 0.0],
            [3.0, 2.0, 2.0],
        ];
        let pca = Pca::fit(&data, 3);
        for i in 0..3 {
            for j in 0..3 {
                let dot = pca.components.row(i).dot(&pca.components.row(j));
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!(
                    (dot - expected).abs() < 1e-6,
                    "components {} and {} not orthonormal: {}",
                    i,
                    j,
                    dot
                );
            }
        }
    }
}

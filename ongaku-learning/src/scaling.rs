//! Robust scaling and value hygiene
//!
//! The embedding front end: per-feature centring on the median and scaling
//! by the interquartile range, followed by a hard clip. Median/IQR (rather
//! than mean/variance) because `-inf` padding survives as enormous negative
//! values that would wreck any moment-based scaler.

use ndarray::{Array1, Array2};

/// Per-feature median/IQR scaler
#[derive(Debug, Clone)]
pub struct RobustScaler {
    center: Array1<f64>,
    scale: Array1<f64>,
}

impl RobustScaler {
    /// Fit medians and interquartile ranges per column.
    ///
    /// Features with zero IQR keep unit scale so constant columns pass
    /// through centred but unscaled.
    pub fn fit(data: &Array2<f64>) -> Self {
        let n_features = data.ncols();
        let mut center = Array1::zeros(n_features);
        let mut scale = Array1::ones(n_features);

        for col in 0..n_features {
            let mut values: Vec<f64> = data.column(col).to_vec();
            values.sort_by(|a, b| a.total_cmp(b));
            center[col] = quantile_sorted(&values, 0.5);
            let iqr = quantile_sorted(&values, 0.75) - quantile_sorted(&values, 0.25);
            if iqr > 0.0 {
                scale[col] = iqr;
            }
        }

        Self { center, scale }
    }

    /// Apply the fitted transform
    pub fn transform(&self, data: &Array2<f64>) -> Array2<f64> {
        let mut out = data.clone();
        for mut row in out.rows_mut() {
            row -= &self.center;
            row /= &self.scale;
        }
        out
    }

    pub fn fit_transform(data: &Array2<f64>) -> Array2<f64> {
        Self::fit(data).transform(data)
    }
}

/// Linear-interpolation quantile of pre-sorted values
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let position = q * (sorted.len() - 1) as f64;
    let below = position.floor() as usize;
    let above = position.ceil() as usize;
    if below == above {
        return sorted[below];
    }
    let weight = position - below as f64;
    sorted[below] * (1.0 - weight) + sorted[above] * weight
}

/// numpy `nan_to_num` semantics: NaN becomes 0, infinities become the most
/// extreme finite values
pub fn nan_to_num(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else if value == f64::INFINITY {
        f64::MAX
    } else if value == f64::NEG_INFINITY {
        f64::MIN
    } else {
        value
    }
}

/// Clamp every element into `[lo, hi]`
pub fn clip(data: &mut Array2<f64>, lo: f64, hi: f64) {
    data.mapv_inplace(|v| v.clamp(lo, hi));
}

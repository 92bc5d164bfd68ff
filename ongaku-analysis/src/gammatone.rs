//! ERB gammatone filterbank
//!
//! Slaney's all-pole approximation of the 4th-order gammatone filter, the
//! same formulation the cochlear-modelling literature standardized on:
//! centre frequencies spaced on the ERB (equivalent rectangular bandwidth)
//! scale, each band realized as a cascade of four second-order IIR sections
//! sharing one pole pair, with an analytic gain term that normalizes the
//! response to unity at the centre frequency.

use ndarray::Array2;
use num_complex::Complex;
use std::f64::consts::TAU;
use thiserror::Error;

/// Glasberg & Moore ERB scale constants
const EAR_Q: f64 = 9.26449;
const MIN_BW: f64 = 24.7;

/// Bandwidth multiplier for the 4th-order approximation
const BANDWIDTH_FACTOR: f64 = 1.019;

/// Filterbank construction errors
#[derive(Debug, Error)]
pub enum FilterbankError {
    /// Zero bands requested
    #[error("Filterbank needs at least one band")]
    NoBands,

    /// Frequency floor at or above Nyquist
    #[error("Minimum frequency {min_frequency} Hz must lie below Nyquist ({nyquist} Hz)")]
    FrequencyRange { min_frequency: f64, nyquist: f64 },
}

/// ERB-spaced centre frequencies between `f_min` and Nyquist, ascending
pub fn centre_freqs(sample_rate: f64, n_bands: usize, f_min: f64) -> Vec<f64> {
    let f_max = sample_rate / 2.0;
    let c = EAR_Q * MIN_BW;
    let step = ((f_min + c).ln() - (f_max + c).ln()) / n_bands as f64;

    // Index 1 sits just under Nyquist, index n at f_min; reverse so band 0
    // is the lowest frequency.
    let mut freqs: Vec<f64> = (1..=n_bands)
        .map(|i| -c + (i as f64 * step).exp() * (f_max + c))
        .collect();
    freqs.reverse();
    freqs
}

/// Coefficients for one gammatone band
#[derive(Debug, Clone)]
struct BandFilter {
    centre_frequency: f64,
    /// Feed-forward coefficients [n0, n1] for the four cascaded sections
    /// (n2 is always zero; the first section folds in the gain term)
    numerators: [[f64; 2]; 4],
    /// Shared feedback coefficients [b1, b2] (b0 is 1)
    feedback: [f64; 2],
}

impl BandFilter {
    fn design(sample_rate: f64, cf: f64) -> Self {
        let t = 1.0 / sample_rate;
        let erb = cf / EAR_Q + MIN_BW;
        let b = BANDWIDTH_FACTOR * TAU * erb;
        let arg = TAU * cf * t;

        let exp_bt = (b * t).exp();
        let cos_a = arg.cos();
        let sin_a = arg.sin();
        let sqrt_plus = (3.0 + 2.0_f64.powf(1.5)).sqrt();
        let sqrt_minus = (3.0 - 2.0_f64.powf(1.5)).sqrt();

        let b1 = -2.0 * cos_a / exp_bt;
        let b2 = (-2.0 * b * t).exp();

        let common = 2.0 * t * cos_a / exp_bt;
        let spread = |s: f64| -(common + 2.0 * s * t * sin_a / exp_bt) / 2.0;
        let a11 = spread(sqrt_plus);
        let a12 = spread(-sqrt_plus);
        let a13 = spread(sqrt_minus);
        let a14 = spread(-sqrt_minus);

        let gain = Self::gain(t, b, arg, cos_a, sin_a, sqrt_plus, sqrt_minus);

        Self {
            centre_frequency: cf,
            numerators: [
                [t / gain, a11 / gain],
                [t, a12],
                [t, a13],
                [t, a14],
            ],
            feedback: [b1, b2],
        }
    }

    /// Magnitude of the cascade's transfer function at the centre frequency
    fn gain(
        t: f64,
        b: f64,
        arg: f64,
        cos_a: f64,
        sin_a: f64,
        sqrt_plus: f64,
        sqrt_minus: f64,
    ) -> f64 {
        // Evaluated on the unit circle at z = e^{j 2π cf T}
        let w = Complex::new(0.0, 2.0 * arg).exp();
        let u = Complex::new(-(b * t), arg).exp();

        let zero = |s: f64| -2.0 * t * w + 2.0 * t * u * (cos_a + s * sin_a);
        let numerator = zero(-sqrt_minus) * zero(sqrt_minus) * zero(-sqrt_plus) * zero(sqrt_plus);

        let d = -2.0 / (2.0 * b * t).exp() - 2.0 * w + 2.0 * (1.0 + w) / exp_bt_complex(b, t);
        let denominator = d * d * d * d;

        (numerator / denominator).norm()
    }

    /// Run the four-section cascade over the signal, writing into `out`
    fn process_into(&self, samples: &[f64], out: &mut [f64]) {
        debug_assert_eq!(samples.len(), out.len());
        out.copy_from_slice(samples);

        let [b1, b2] = self.feedback;
        for [n0, n1] in self.numerators {
            let mut x1 = 0.0;
            let mut y1 = 0.0;
            let mut y2 = 0.0;
            for value in out.iter_mut() {
                let x0 = *value;
                let y0 = n0 * x0 + n1 * x1 - b1 * y1 - b2 * y2;
                x1 = x0;
                y2 = y1;
                y1 = y0;
                *value = y0;
            }
        }
    }
}

fn exp_bt_complex(b: f64, t: f64) -> Complex<f64> {
    Complex::new((b * t).exp(), 0.0)
}

/// Bank of ERB-spaced gammatone filters
#[derive(Debug, Clone)]
pub struct GammatoneFilterbank {
    sample_rate: f64,
    bands: Vec<BandFilter>,
}

impl GammatoneFilterbank {
    /// Design a filterbank of `n_bands` filters between `f_min` and Nyquist
    pub fn new(sample_rate: f64, n_bands: usize, f_min: f64) -> Result<Self, FilterbankError> {
        if n_bands == 0 {
            return Err(FilterbankError::NoBands);
        }
        let nyquist = sample_rate / 2.0;
        if f_min >= nyquist {
            return Err(FilterbankError::FrequencyRange {
                min_frequency: f_min,
                nyquist,
            });
        }

        let bands = centre_freqs(sample_rate, n_bands, f_min)
            .into_iter()
            .map(|cf| BandFilter::design(sample_rate, cf))
            .collect();

        Ok(Self { sample_rate, bands })
    }

    /// Number of bands
    pub fn n_bands(&self) -> usize {
        self.bands.len()
    }

    /// Sample rate the filters were designed for
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Centre frequencies in ascending order
    pub fn centre_frequencies(&self) -> Vec<f64> {
        self.bands.iter().map(|b| b.centre_frequency).collect()
    }

    /// Filter the signal through every band.
    ///
    /// Returns a `n_bands x n_samples` matrix, row 0 the lowest band.
    pub fn process(&self, samples: &[f64]) -> Array2<f64> {
        let mut output = Array2::zeros((self.bands.len(), samples.len()));
        for (band, mut row) in self.bands.iter().zip(output.rows_mut()) {
            let row_slice = row
                .as_slice_mut()
                .expect("row of freshly allocated matrix is contiguous");
            band.process_into(samples, row_slice);
        }
        output
    }
}

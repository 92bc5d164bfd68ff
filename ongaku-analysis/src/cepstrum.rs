//! Gammatone cepstral analysis
//!
//! Turns decoded audio into the per-song quefrency matrix the rest of the
//! system works with: the signal is run through the ERB filterbank, band
//! power is averaged over fixed non-overlapping windows, and the result is
//! converted to decibels. Silent windows come out as `-inf`, never NaN.

use crate::decoder::DecodedAudio;
use crate::gammatone::{FilterbankError, GammatoneFilterbank};
use ndarray::Array2;
use ongaku_common::Cepstrum;
use thiserror::Error;

/// Cepstral analysis errors
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Song exceeds the configured length cap (memory guard)
    #[error("Song is {seconds:.0}s long, cap is {max_seconds:.0}s")]
    TooLong { seconds: f64, max_seconds: f64 },

    /// Song is shorter than a single analysis window
    #[error("Song is shorter than one analysis window ({window_seconds}s)")]
    TooShort { window_seconds: f64 },

    /// Filterbank could not be designed for this sample rate
    #[error(transparent)]
    Filterbank(#[from] FilterbankError),
}

/// Analysis parameters
#[derive(Debug, Clone, Copy)]
pub struct CepstrumConfig {
    /// Number of quefrency bands
    pub bands: usize,
    /// Window width in seconds; windows do not overlap
    pub window_seconds: f64,
    /// Lowest centre frequency in Hz
    pub min_frequency: f64,
    /// Songs longer than this are rejected
    pub max_song_seconds: f64,
}

impl Default for CepstrumConfig {
    fn default() -> Self {
        Self {
            bands: 16,
            window_seconds: 1.0,
            min_frequency: 20.0,
            max_song_seconds: 1080.0,
        }
    }
}

/// Gammatone cepstrum analyzer
#[derive(Debug, Clone)]
pub struct CepstrumAnalyzer {
    config: CepstrumConfig,
}

impl CepstrumAnalyzer {
    pub fn new(config: CepstrumConfig) -> Self {
        Self { config }
    }

    /// Compute the gammatone cepstrum of a decoded song.
    ///
    /// Output is `bands x frames`, row 0 the lowest band, one column per
    /// window, values in dB.
    pub fn analyze(&self, audio: &DecodedAudio) -> Result<Cepstrum, AnalysisError> {
        let seconds = audio.duration_seconds();
        if seconds > self.config.max_song_seconds {
            return Err(AnalysisError::TooLong {
                seconds,
                max_seconds: self.config.max_song_seconds,
            });
        }

        let sample_rate = audio.sample_rate as f64;
        let window = (self.config.window_seconds * sample_rate).round() as usize;
        if window == 0 || audio.samples.len() < window {
            return Err(AnalysisError::TooShort {
                window_seconds: self.config.window_seconds,
            });
        }

        let bank =
            GammatoneFilterbank::new(sample_rate, self.config.bands, self.config.min_frequency)?;

        // Band-pass the signal, then square for instantaneous power
        let mut power = bank.process(&audio.samples);
        power.mapv_inplace(|v| v * v);

        // Window equals hop: non-overlapping frames
        let frames = (audio.samples.len() - window) / window + 1;
        let mut output = Array2::zeros((self.config.bands, frames));
        for frame in 0..frames {
            let start = frame * window;
            for band in 0..self.config.bands {
                let slice = power.row(band);
                let mean: f64 =
                    slice.slice(ndarray::s![start..start + window]).mean().unwrap_or(0.0);
                // dB of the RMS-like band level; log10(0) is -inf by design
                output[[band, frame]] = 10.0 * mean.sqrt().log10();
            }
        }

        Ok(Cepstrum::new(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;

    fn tone(sample_rate: u32, freq: f64, seconds: f64) -> DecodedAudio {
        let n = (sample_rate as f64 * seconds) as usize;
        let samples = (0..n)
            .map(|i| (TAU * freq * i as f64 / sample_rate as f64).sin())
            .collect();
        DecodedAudio {
            samples,
            sample_rate,
        }
    }

    #[test]
    fn frame_count_follows_duration() {
        let analyzer = CepstrumAnalyzer::new(CepstrumConfig {
            bands: 8,
            window_seconds: 1.0,
            min_frequency: 50.0,
            max_song_seconds: 1080.0,
        });
        let cepstrum = analyzer.analyze(&tone(8000, 440.0, 5.0)).unwrap();
        assert_eq!(cepstrum.bands(), 8);
        assert_eq!(cepstrum.frames(), 5);
    }

    #[test]
    fn tone_energy_lands_in_the_right_band() {
        let config = CepstrumConfig {
            bands: 8,
            window_seconds: 1.0,
            min_frequency: 50.0,
            max_song_seconds: 1080.0,
        };
        let analyzer = CepstrumAnalyzer::new(config);
        let bank = GammatoneFilterbank::new(8000.0, 8, 50.0).unwrap();
        let cfs = bank.centre_frequencies();

        let cepstrum = analyzer.analyze(&tone(8000, cfs[5], 3.0)).unwrap();
        let matrix = cepstrum.matrix();

        // The driven band should carry more energy than the extremes in
        // every frame
        for frame in 0..cepstrum.frames() {
            assert!(matrix[[5, frame]] > matrix[[0, frame]]);
            assert!(matrix[[5, frame]] > matrix[[7, frame]]);
        }
    }

    #[test]
    fn silence_maps_to_negative_infinity() {
        let analyzer = CepstrumAnalyzer::new(CepstrumConfig {
            bands: 4,
            window_seconds: 1.0,
            min_frequency: 50.0,
            max_song_seconds: 1080.0,
        });
        let silent = DecodedAudio {
            samples: vec![0.0; 16000],
            sample_rate: 8000,
        };
        let cepstrum = analyzer.analyze(&silent).unwrap();
        assert!(cepstrum.matrix().iter().all(|&v| v == f64::NEG_INFINITY));
    }

    #[test]
    fn over_length_songs_are_rejected() {
        let analyzer = CepstrumAnalyzer::new(CepstrumConfig {
            bands: 4,
            window_seconds: 1.0,
            min_frequency: 50.0,
            max_song_seconds: 2.0,
        });
        let result = analyzer.analyze(&tone(8000, 440.0, 3.0));
        assert!(matches!(result, Err(AnalysisError::TooLong { .. })));
    }

    #[test]
    fn sub_window_songs_are_rejected() {
        let analyzer = CepstrumAnalyzer::new(CepstrumConfig::default());
        let result = analyzer.analyze(&tone(8000, 440.0, 0.25));
        assert!(matches!(result, Err(AnalysisError::TooShort { .. })));
    }
}

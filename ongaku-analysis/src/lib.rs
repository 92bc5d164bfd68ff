//! # Ongaku Analysis
//!
//! First stage of the Ongaku pipeline: turn a music library into a corpus
//! of gammatone cepstra.
//!
//! - Library scanning with format verification ([`scanner`])
//! - Audio decoding to mono PCM ([`decoder`])
//! - ERB gammatone filterbank ([`gammatone`])
//! - Cepstral analysis ([`cepstrum`])
//! - Tag extraction from file metadata ([`metadata`])
//! - The batch preprocessing pipeline ([`pipeline`])

pub mod cepstrum;
pub mod decoder;
pub mod gammatone;
pub mod metadata;
pub mod pipeline;
pub mod scanner;

pub use cepstrum::{CepstrumAnalyzer, CepstrumConfig};
pub use decoder::decode_first_channel;
pub use pipeline::{Preprocessor, PreprocessSummary};
pub use scanner::LibraryScanner;

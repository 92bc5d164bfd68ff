//! # Ongaku Common Library
//!
//! Shared code for the Ongaku analysis stages including:
//! - Corpus tags (song identity within the corpus)
//! - Cepstrum and manifold data types
//! - SQLite storage for cepstra, song locations, and embeddings
//! - Configuration loading
//! - Common error type

pub mod cepstrum;
pub mod config;
pub mod db;
pub mod error;
pub mod manifold;
pub mod tags;

pub use cepstrum::Cepstrum;
pub use error::{Error, Result};
pub use manifold::Manifold;
pub use tags::CorpusTag;

/// Install a default tracing subscriber for library consumers that do not
/// set up their own. Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

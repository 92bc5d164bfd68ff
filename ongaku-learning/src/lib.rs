//! # Ongaku Learning
//!
//! Second stage of the Ongaku pipeline: assemble the stored cepstra into a
//! corpus, shape it (crop/pad/flatten), and embed it into a low-dimensional
//! metric space.
//!
//! - Corpus assembly and shaping ([`corpus`])
//! - Robust scaling and clipping ([`scaling`])
//! - PCA ([`pca`]) and Isomap ([`isomap`])
//! - The embedding pipeline producing a [`ongaku_common::Manifold`]
//!   ([`embedding`])
//! - Corpus-quality metrics ([`metrics`])

pub mod corpus;
pub mod embedding;
pub mod isomap;
pub mod metrics;
pub mod pca;
pub mod scaling;

pub use corpus::{Corpus, FlatCorpus};
pub use embedding::{Embedder, EmbedderConfig};
pub use isomap::IsomapConfig;

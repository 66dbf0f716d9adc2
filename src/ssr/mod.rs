//! Semantic Similarity Rating
//!
//! Turns free-text utterances into probability distributions over a 1-5
//! rating scale by comparing them to anchored reference statements in a
//! shared embedding space. The embedding backend is pluggable; everything
//! downstream of it is deterministic.

pub mod embedder;
pub mod enrich;
pub mod quantizer;
pub mod scale;

pub use embedder::{cosine_similarity, Embedder, HashEmbedder};
pub use enrich::{EnrichmentPool, EnrichmentRequest, TextGenerator};
pub use quantizer::{QuantizerStats, ResponsePmf, ResponseQuantizer};
pub use scale::{agreement_scale, ScaleDefinition, ScalePoint, SCALE_POINTS};

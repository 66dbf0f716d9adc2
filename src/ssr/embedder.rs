//! Embedding Seam
//!
//! Quantization only needs *some* shared vector space with a cosine
//! metric; which model provides it is a deployment decision. The trait
//! keeps the core vendor-agnostic, and the hash embedder gives a
//! deterministic, dependency-free default for tests and offline runs.

use anyhow::Result;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Text-to-vector backends, real or synthetic.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
    fn embedding_dim(&self) -> usize;
}

/// Deterministic feature-hashing embedder.
///
/// Each lowercase token is hashed into one of `dimension` buckets with a
/// hash-derived sign, and the result is L2-normalized. Texts sharing
/// vocabulary land close together under cosine similarity, which is all
/// the quantizer needs.
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub const DEFAULT_DIMENSION: usize = 256;

    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(8),
        }
    }

    fn hash_token(token: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        hasher.finish()
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIMENSION)
    }
}

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimension];

        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let hash = Self::hash_token(token);
            let bucket = (hash % self.dimension as u64) as usize;
            // One hash bit decides the sign, which keeps unrelated tokens
            // from piling mass into the same direction.
            let sign = if hash & (1 << 63) == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        Ok(vector)
    }

    fn embedding_dim(&self) -> usize {
        self.dimension
    }
}

/// Cosine similarity between two vectors; 0.0 on mismatched lengths or
/// zero norms.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        let c = vec![2.0, 0.0, 0.0];

        assert_eq!(cosine_similarity(&a, &b), 0.0);
        assert_eq!(cosine_similarity(&a, &c), 1.0);
        assert_eq!(cosine_similarity(&a, &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_embed_deterministic() {
        let embedder = HashEmbedder::default();
        let a = embedder.embed("this product is excellent").unwrap();
        let b = embedder.embed("this product is excellent").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_embed_normalized() {
        let embedder = HashEmbedder::default();
        let v = embedder.embed("strongly agree with the statement").unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_shared_vocabulary_raises_similarity() {
        let embedder = HashEmbedder::default();
        let base = embedder.embed("the onboarding flow was clear and fast").unwrap();
        let near = embedder.embed("the onboarding flow was confusing").unwrap();
        let far = embedder.embed("quarterly revenue grew eight percent").unwrap();

        let near_sim = cosine_similarity(&base, &near);
        let far_sim = cosine_similarity(&base, &far);
        assert!(near_sim > far_sim);
    }

    #[test]
    fn test_empty_text_embeds_to_zero() {
        let embedder = HashEmbedder::default();
        let v = embedder.embed("").unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }
}

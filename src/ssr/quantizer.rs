//! Semantic-Similarity Response Quantizer
//!
//! Converts one free-text utterance into a probability distribution over a
//! 1-5 rating scale: cosine similarity against the five anchor statements,
//! temperature-scaled softmax, optional epsilon floor. Anchor embeddings
//! are computed once per scale at load time; utterance embeddings are
//! cached.

use crate::error::{CohortError, Result};
use crate::ssr::embedder::{cosine_similarity, Embedder};
use crate::ssr::scale::{ScaleDefinition, SCALE_POINTS};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Softmax temperature floor; anything lower degenerates to argmax anyway.
const MIN_TEMPERATURE: f64 = 1e-6;
/// Epsilon above 1/5 would invert the distribution's shape.
const MAX_EPSILON: f64 = 0.2;

/// Probability mass function over the five rating points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsePmf {
    probabilities: [f64; SCALE_POINTS],
    expected_value: f64,
    mode: u8,
}

impl ResponsePmf {
    /// Build from raw non-negative masses; normalizes and derives the
    /// expected value and mode.
    pub fn from_masses(masses: [f64; SCALE_POINTS]) -> Self {
        let total: f64 = masses.iter().sum();
        let probabilities = if total > 0.0 {
            let mut p = masses;
            for v in &mut p {
                *v /= total;
            }
            p
        } else {
            Self::uniform_probabilities()
        };

        let expected_value = probabilities
            .iter()
            .enumerate()
            .map(|(i, p)| (i + 1) as f64 * p)
            .sum();
        let mode = probabilities
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| (i + 1) as u8)
            .unwrap_or(3);

        Self {
            probabilities,
            expected_value,
            mode,
        }
    }

    /// Flat distribution, 0.2 per point.
    pub fn uniform() -> Self {
        Self::from_masses(Self::uniform_probabilities())
    }

    fn uniform_probabilities() -> [f64; SCALE_POINTS] {
        [1.0 / SCALE_POINTS as f64; SCALE_POINTS]
    }

    pub fn probabilities(&self) -> &[f64; SCALE_POINTS] {
        &self.probabilities
    }

    /// Probability of one rating point, 1..=5.
    pub fn probability_of(&self, point: u8) -> f64 {
        if (1..=SCALE_POINTS as u8).contains(&point) {
            self.probabilities[(point - 1) as usize]
        } else {
            0.0
        }
    }

    pub fn expected_value(&self) -> f64 {
        self.expected_value
    }

    pub fn mode(&self) -> u8 {
        self.mode
    }
}

/// Usage counters for the quantizer.
#[derive(Debug, Default, Clone)]
pub struct QuantizerStats {
    pub quantize_calls: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub degraded_fallbacks: u64,
}

/// A validated scale with its anchor embeddings precomputed.
struct LoadedScale {
    definition: ScaleDefinition,
    anchors: Vec<Vec<f32>>,
}

/// Quantizer instance holding the scale registry and embedding cache.
pub struct ResponseQuantizer {
    embedder: Arc<dyn Embedder>,
    scales: RwLock<HashMap<String, LoadedScale>>,
    cache: RwLock<HashMap<String, Vec<f32>>>,
    stats: RwLock<QuantizerStats>,
}

impl ResponseQuantizer {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            scales: RwLock::new(HashMap::new()),
            cache: RwLock::new(HashMap::new()),
            stats: RwLock::new(QuantizerStats::default()),
        }
    }

    /// Validate a scale and precompute its anchor embeddings. Embedding
    /// failure here is a load-time validation failure, not a degraded
    /// call.
    pub fn load_scale(&self, definition: ScaleDefinition) -> Result<()> {
        definition.validate()?;

        let mut anchors = Vec::with_capacity(SCALE_POINTS);
        for anchor in definition.ordered_anchors() {
            let embedding = self.embedder.embed(anchor).map_err(|e| {
                CohortError::validation(format!(
                    "scale '{}': embedding anchor failed: {e}",
                    definition.id
                ))
            })?;
            anchors.push(embedding);
        }

        self.scales
            .write()
            .insert(definition.id.clone(), LoadedScale { definition, anchors });
        Ok(())
    }

    pub fn has_scale(&self, scale_id: &str) -> bool {
        self.scales.read().contains_key(scale_id)
    }

    /// The definition a scale was loaded from.
    pub fn scale_definition(&self, scale_id: &str) -> Option<ScaleDefinition> {
        self.scales
            .read()
            .get(scale_id)
            .map(|loaded| loaded.definition.clone())
    }

    pub fn scale_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.scales.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Quantize with the default temperature (1.0) and no epsilon floor.
    pub fn quantize(&self, scale_id: &str, utterance: &str) -> Result<ResponsePmf> {
        self.quantize_with(scale_id, utterance, 1.0, 0.0)
    }

    /// Quantize one utterance against a loaded scale.
    ///
    /// Lower temperature sharpens mass toward the nearest anchor, higher
    /// flattens toward uniform. `epsilon` floors every probability before
    /// renormalizing, keeping single-point mass out of downstream math.
    pub fn quantize_with(
        &self,
        scale_id: &str,
        utterance: &str,
        temperature: f64,
        epsilon: f64,
    ) -> Result<ResponsePmf> {
        self.stats.write().quantize_calls += 1;

        let scales = self.scales.read();
        let scale = scales
            .get(scale_id)
            .ok_or_else(|| CohortError::not_found(format!("scale '{scale_id}'")))?;

        if utterance.trim().is_empty() {
            self.stats.write().degraded_fallbacks += 1;
            return Ok(ResponsePmf::uniform());
        }

        let embedding = match self.embed_cached(utterance) {
            Some(embedding) => embedding,
            None => {
                // Embedder trouble is a per-call anomaly, not a reason to
                // abort a bulk run.
                self.stats.write().degraded_fallbacks += 1;
                return Ok(ResponsePmf::uniform());
            }
        };

        let mut similarities = [0.0f64; SCALE_POINTS];
        for (i, anchor) in scale.anchors.iter().enumerate() {
            similarities[i] = f64::from(cosine_similarity(&embedding, anchor));
        }

        let temperature = temperature.max(MIN_TEMPERATURE);
        let epsilon = epsilon.clamp(0.0, MAX_EPSILON);

        // Temperature-scaled softmax, max-shifted for numeric stability.
        let max_logit = similarities
            .iter()
            .map(|s| s / temperature)
            .fold(f64::NEG_INFINITY, f64::max);
        let mut masses = [0.0f64; SCALE_POINTS];
        for (mass, sim) in masses.iter_mut().zip(similarities.iter()) {
            *mass = (sim / temperature - max_logit).exp();
        }

        let mut pmf = ResponsePmf::from_masses(masses);
        if epsilon > 0.0 {
            let mut floored = *pmf.probabilities();
            for p in &mut floored {
                *p = p.max(epsilon);
            }
            pmf = ResponsePmf::from_masses(floored);
        }
        Ok(pmf)
    }

    /// Distribution-preserving survey aggregate: element-wise mean of the
    /// member PMFs, not an average of scalar ratings.
    pub fn aggregate(pmfs: &[ResponsePmf]) -> ResponsePmf {
        if pmfs.is_empty() {
            return ResponsePmf::uniform();
        }

        let mut sums = [0.0f64; SCALE_POINTS];
        for pmf in pmfs {
            for (sum, p) in sums.iter_mut().zip(pmf.probabilities().iter()) {
                *sum += p;
            }
        }
        ResponsePmf::from_masses(sums)
    }

    pub fn stats(&self) -> QuantizerStats {
        self.stats.read().clone()
    }

    fn embed_cached(&self, utterance: &str) -> Option<Vec<f32>> {
        if let Some(cached) = self.cache.read().get(utterance) {
            self.stats.write().cache_hits += 1;
            return Some(cached.clone());
        }

        match self.embedder.embed(utterance) {
            Ok(embedding) => {
                let mut stats = self.stats.write();
                stats.cache_misses += 1;
                drop(stats);
                self.cache
                    .write()
                    .insert(utterance.to_string(), embedding.clone());
                Some(embedding)
            }
            Err(e) => {
                warn!(error = %e, "utterance embedding failed, using uniform fallback");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssr::embedder::HashEmbedder;
    use crate::ssr::scale::agreement_scale;

    fn quantizer() -> ResponseQuantizer {
        let q = ResponseQuantizer::new(Arc::new(HashEmbedder::default()));
        q.load_scale(agreement_scale()).unwrap();
        q
    }

    fn assert_pmf_valid(pmf: &ResponsePmf) {
        let total: f64 = pmf.probabilities().iter().sum();
        assert!((total - 1.0).abs() < 1e-6, "pmf sums to {total}");
        assert!(pmf.probabilities().iter().all(|p| *p >= 0.0));
        assert!((1..=5).contains(&pmf.mode()));
        assert!((1.0..=5.0).contains(&pmf.expected_value()));
    }

    #[test]
    fn test_unknown_scale_not_found() {
        let q = quantizer();
        let err = q.quantize("likelihood", "sure, probably").unwrap_err();
        assert!(matches!(err, CohortError::NotFound(_)));
    }

    #[test]
    fn test_quantize_idempotent() {
        let q = quantizer();
        let a = q
            .quantize_with("agreement", "I strongly agree with this statement", 0.7, 0.01)
            .unwrap();
        let b = q
            .quantize_with("agreement", "I strongly agree with this statement", 0.7, 0.01)
            .unwrap();
        for (pa, pb) in a.probabilities().iter().zip(b.probabilities().iter()) {
            assert!((pa - pb).abs() < 1e-9);
        }
        assert_pmf_valid(&a);
    }

    #[test]
    fn test_anchor_text_lands_on_its_point() {
        let q = quantizer();
        let pmf = q
            .quantize("agreement", "I strongly agree with this statement")
            .unwrap();
        assert_pmf_valid(&pmf);
        assert_eq!(pmf.mode(), 5);
    }

    #[test]
    fn test_low_temperature_concentrates() {
        let q = quantizer();
        let pmf = q
            .quantize_with("agreement", "I strongly agree with this statement", 1e-9, 0.0)
            .unwrap();
        assert_pmf_valid(&pmf);
        assert!(pmf.probability_of(pmf.mode()) >= 0.9);
    }

    #[test]
    fn test_high_temperature_flattens() {
        let q = quantizer();
        let pmf = q
            .quantize_with("agreement", "I strongly agree with this statement", 1e9, 0.0)
            .unwrap();
        assert_pmf_valid(&pmf);
        for p in pmf.probabilities() {
            assert!((p - 0.2).abs() < 1e-3, "probability {p}");
        }
    }

    #[test]
    fn test_epsilon_floor_applied() {
        let q = quantizer();
        let pmf = q
            .quantize_with("agreement", "I strongly agree with this statement", 0.01, 0.02)
            .unwrap();
        assert_pmf_valid(&pmf);
        for p in pmf.probabilities() {
            // Post-renormalization mass stays close to the requested floor.
            assert!(*p >= 0.015, "probability {p} under floor");
        }
    }

    #[test]
    fn test_empty_utterance_near_uniform() {
        let q = quantizer();
        let pmf = q.quantize("agreement", "   ").unwrap();
        assert_pmf_valid(&pmf);
        for p in pmf.probabilities() {
            assert!((p - 0.2).abs() < 1e-9);
        }
    }

    #[test]
    fn test_aggregate_preserves_distribution() {
        let one = ResponsePmf::from_masses([1.0, 0.0, 0.0, 0.0, 0.0]);
        let five = ResponsePmf::from_masses([0.0, 0.0, 0.0, 0.0, 1.0]);
        let survey = ResponseQuantizer::aggregate(&[one, five]);

        assert!((survey.probability_of(1) - 0.5).abs() < 1e-9);
        assert!((survey.probability_of(5) - 0.5).abs() < 1e-9);
        assert!((survey.expected_value() - 3.0).abs() < 1e-9);

        let empty = ResponseQuantizer::aggregate(&[]);
        assert!((empty.probability_of(3) - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_scale_definition_retrievable() {
        let q = quantizer();
        let definition = q.scale_definition("agreement").unwrap();
        assert_eq!(definition.points.len(), 5);
        assert!(q.scale_definition("likelihood").is_none());
        assert_eq!(q.scale_ids(), vec!["agreement".to_string()]);
    }

    #[test]
    fn test_cache_counts_hits() {
        let q = quantizer();
        q.quantize("agreement", "great experience overall").unwrap();
        q.quantize("agreement", "great experience overall").unwrap();
        let stats = q.stats();
        assert_eq!(stats.cache_misses, 1);
        assert_eq!(stats.cache_hits, 1);
    }
}

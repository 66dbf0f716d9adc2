//! Enrichment Worker Pool
//!
//! The one genuinely slow operation in a run is asking an external
//! text-generation service for utterances to quantize. Each call is
//! independent and idempotent, so a bounded pool of workers drains the
//! request list without any coordination beyond a shared cursor. Retry
//! exhaustion marks the enrichment absent; it never aborts the run.

use crate::cohort::Persona;
use crate::error::CohortError;
use crate::ssr::quantizer::{ResponsePmf, ResponseQuantizer};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

/// Black-box text-generation collaborator.
pub trait TextGenerator: Send + Sync {
    /// Produce one free-text utterance for a persona reacting to a
    /// stimulus, phrased for the named rating scale.
    fn generate(
        &self,
        persona: &Persona,
        stimulus: &str,
        scale_id: &str,
    ) -> anyhow::Result<String>;
}

/// One enrichment to perform.
pub struct EnrichmentRequest<'a> {
    pub persona: &'a Persona,
    pub stimulus: String,
    pub scale_id: String,
    pub temperature: f64,
    pub epsilon: f64,
}

impl<'a> EnrichmentRequest<'a> {
    pub fn new(persona: &'a Persona, stimulus: impl Into<String>, scale_id: impl Into<String>) -> Self {
        Self {
            persona,
            stimulus: stimulus.into(),
            scale_id: scale_id.into(),
            temperature: 1.0,
            epsilon: 0.0,
        }
    }
}

/// Bounded worker pool for enrichment calls.
pub struct EnrichmentPool {
    workers: usize,
    max_attempts: u32,
}

impl Default for EnrichmentPool {
    fn default() -> Self {
        Self {
            workers: num_cpus::get().clamp(1, 8),
            max_attempts: 2,
        }
    }
}

impl EnrichmentPool {
    pub fn new(workers: usize, max_attempts: u32) -> Self {
        Self {
            workers: workers.max(1),
            max_attempts: max_attempts.max(1),
        }
    }

    /// Run every request, preserving order. A `None` slot means the
    /// collaborator kept failing and that step stays unenriched.
    pub fn run(
        &self,
        quantizer: &ResponseQuantizer,
        generator: &dyn TextGenerator,
        requests: &[EnrichmentRequest<'_>],
    ) -> Vec<Option<ResponsePmf>> {
        if requests.is_empty() {
            return Vec::new();
        }

        let results = Mutex::new(vec![None; requests.len()]);
        let cursor = AtomicUsize::new(0);
        let worker_count = self.workers.min(requests.len());

        std::thread::scope(|scope| {
            for _ in 0..worker_count {
                scope.spawn(|| loop {
                    let index = cursor.fetch_add(1, Ordering::Relaxed);
                    if index >= requests.len() {
                        break;
                    }
                    let pmf = self.enrich_one(quantizer, generator, &requests[index]);
                    results.lock()[index] = pmf;
                });
            }
        });

        let produced = results.into_inner();
        debug!(
            requested = requests.len(),
            enriched = produced.iter().filter(|p| p.is_some()).count(),
            "enrichment pass finished"
        );
        produced
    }

    fn enrich_one(
        &self,
        quantizer: &ResponseQuantizer,
        generator: &dyn TextGenerator,
        request: &EnrichmentRequest<'_>,
    ) -> Option<ResponsePmf> {
        for attempt in 1..=self.max_attempts {
            let utterance = match generator.generate(
                request.persona,
                &request.stimulus,
                &request.scale_id,
            ) {
                Ok(utterance) => utterance,
                Err(e) => {
                    warn!(
                        attempt,
                        persona = %request.persona.id,
                        error = %e,
                        "text generation failed"
                    );
                    continue;
                }
            };

            match quantizer.quantize_with(
                &request.scale_id,
                &utterance,
                request.temperature,
                request.epsilon,
            ) {
                Ok(pmf) => return Some(pmf),
                // Typed quantizer errors are permanent for this request;
                // retrying the generator will not fix an unknown scale.
                Err(CohortError::NotFound(msg)) => {
                    warn!(%msg, "enrichment skipped");
                    return None;
                }
                Err(e) => {
                    warn!(error = %e, "quantization failed");
                    return None;
                }
            }
        }

        warn!(
            persona = %request.persona.id,
            attempts = self.max_attempts,
            "enrichment attempts exhausted, marking absent"
        );
        None
    }
}

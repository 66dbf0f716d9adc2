//! Synthetic Cohort Generator
//!
//! Builds large populations of fictitious users for product research.
//! Three pieces do the statistical work:
//!
//! - the **attribute correlation sampler** ([`cohort`]): archetype
//!   declarations in, personas with jointly-biased attributes out;
//! - the **journey progression simulator** ([`journey`]): a stochastic
//!   state machine advancing each persona through a shared phase plan
//!   under one of three interchangeable strategies;
//! - the **semantic-similarity response quantizer** ([`ssr`]): free-text
//!   utterances in, probability distributions over a 1-5 rating scale out.
//!
//! Sampling and simulation are synchronous and deterministic for a given
//! seed. The only concurrency lives in the optional enrichment pool,
//! where external text-generation calls fan out over bounded workers.

pub mod cohort;
pub mod config;
pub mod error;
pub mod journey;
pub mod ssr;

pub use cohort::{Cohort, CohortGenerator, CohortMember, CohortReport, CohortRequest, Persona};
pub use config::{
    ConfigLoader, JourneyPhase, LookupTables, PersonaArchetype,
};
pub use error::{CohortError, Result};
pub use journey::{Journey, JourneySimulator, ProgressionStrategy, Step, StepStatus};
pub use ssr::{
    Embedder, EnrichmentPool, HashEmbedder, ResponsePmf, ResponseQuantizer, ScaleDefinition,
    TextGenerator,
};

//! Declarative Configuration - Archetypes, Phases, Lookup Tables
//!
//! Everything a generation run consumes is declared up front and validated
//! before the first draw: persona archetypes, the ordered journey phase
//! plan, and the persona-type conditional lookup tables.

pub mod archetype;
pub mod loader;
pub mod lookup;
pub mod phase;

pub use archetype::{
    validate_population, AttributeRange, CategoricalDistribution, CategoricalOption,
    CompletionRange, CorrelationHint, Leaning, PersonaArchetype, WEIGHT_TOLERANCE,
};
pub use loader::ConfigLoader;
pub use lookup::{CaptureBehavior, EngagementTier, LookupTables, DEFAULT_EMOTIONAL_STATE};
pub use phase::{validate_phases, JourneyPhase};

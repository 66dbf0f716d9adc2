//! Persona - One Instantiated Draw From an Archetype
//!
//! A persona owns its resolved attribute values and derived labels.
//! It is created once by the sampler and never mutated afterwards.

use crate::config::{CaptureBehavior, CompletionRange, EngagementTier};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Numeric attribute the engagement tier and step scores derive from.
pub const ENGAGEMENT_ATTRIBUTE: &str = "engagement";

/// Base engagement assumed when an archetype declares no engagement
/// attribute.
pub const DEFAULT_ENGAGEMENT: f64 = 0.5;

/// One synthetic user, fully resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    pub id: Uuid,
    /// Archetype this persona was drawn from; doubles as the persona type
    /// key into the lookup tables.
    pub archetype_id: String,
    pub numeric: HashMap<String, f64>,
    pub categorical: HashMap<String, String>,
    pub engagement_tier: EngagementTier,
    pub capture_behavior: CaptureBehavior,
    /// Per-phase completion probability overrides copied from the
    /// archetype at draw time.
    pub phase_completion: HashMap<String, CompletionRange>,
}

impl Persona {
    pub fn persona_type(&self) -> &str {
        &self.archetype_id
    }

    pub fn numeric(&self, name: &str) -> Option<f64> {
        self.numeric.get(name).copied()
    }

    pub fn categorical(&self, name: &str) -> Option<&str> {
        self.categorical.get(name).map(String::as_str)
    }

    /// Base engagement in [0, 1], defaulting when undeclared.
    pub fn base_engagement(&self) -> f64 {
        self.numeric(ENGAGEMENT_ATTRIBUTE)
            .unwrap_or(DEFAULT_ENGAGEMENT)
            .clamp(0.0, 1.0)
    }

    /// Declared completion range for a phase, if the archetype overrode it.
    pub fn completion_range(&self, phase_name: &str) -> Option<CompletionRange> {
        self.phase_completion.get(phase_name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engagement_defaults() {
        let persona = Persona {
            id: Uuid::new_v4(),
            archetype_id: "seeker".to_string(),
            numeric: HashMap::new(),
            categorical: HashMap::new(),
            engagement_tier: EngagementTier::Standard,
            capture_behavior: CaptureBehavior::Opportunistic,
            phase_completion: HashMap::new(),
        };
        assert_eq!(persona.base_engagement(), DEFAULT_ENGAGEMENT);

        let mut with_value = persona.clone();
        with_value.numeric.insert(ENGAGEMENT_ATTRIBUTE.to_string(), 0.9);
        assert_eq!(with_value.base_engagement(), 0.9);
    }
}

//! Lookup Tables - Persona-Type Conditional Data
//!
//! Emotional-state candidates and capture-behavior distributions live here
//! as plain read-only mappings, so adding an archetype never touches
//! simulator code.

use crate::config::archetype::CategoricalDistribution;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Label used when no emotional-state candidates exist for a
/// persona-type/phase pair.
pub const DEFAULT_EMOTIONAL_STATE: &str = "neutral";

/// Session-count and dropout propensity class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementTier {
    High,
    Standard,
    Low,
}

impl EngagementTier {
    /// Derive the tier from a base engagement value in [0, 1].
    pub fn from_engagement(engagement: f64) -> Self {
        if engagement > 0.7 {
            Self::High
        } else if engagement < 0.4 {
            Self::Low
        } else {
            Self::Standard
        }
    }
}

/// Shape of the inter-session interval distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureBehavior {
    /// Narrow, regular intervals.
    Systematic,
    /// Wide uniform intervals.
    Opportunistic,
    /// Bursts: per group of five sessions, three short intervals then
    /// two long ones.
    CrisisDriven,
    /// Wide-variance uniform intervals.
    Experimental,
}

impl CaptureBehavior {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "systematic" => Some(Self::Systematic),
            "opportunistic" => Some(Self::Opportunistic),
            "crisis_driven" => Some(Self::CrisisDriven),
            "experimental" => Some(Self::Experimental),
            _ => None,
        }
    }
}

/// Read-only conditional tables keyed by persona type (archetype id).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LookupTables {
    /// persona type -> phase name -> emotional-state candidates.
    #[serde(default)]
    pub emotional_states: HashMap<String, HashMap<String, Vec<String>>>,
    /// persona type -> weighted capture-behavior distribution. Option
    /// values must parse as [`CaptureBehavior`] names.
    #[serde(default)]
    pub capture_behavior: HashMap<String, CategoricalDistribution>,
}

impl LookupTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Candidate emotional states for a persona type in a phase, if any
    /// were declared.
    pub fn emotional_candidates(&self, persona_type: &str, phase: &str) -> Option<&[String]> {
        self.emotional_states
            .get(persona_type)
            .and_then(|phases| phases.get(phase))
            .map(Vec::as_slice)
            .filter(|candidates| !candidates.is_empty())
    }

    pub fn capture_distribution(&self, persona_type: &str) -> Option<&CategoricalDistribution> {
        self.capture_behavior
            .get(persona_type)
            .filter(|dist| !dist.is_empty())
    }

    pub fn with_emotional_states(
        mut self,
        persona_type: &str,
        phase: &str,
        states: &[&str],
    ) -> Self {
        self.emotional_states
            .entry(persona_type.to_string())
            .or_default()
            .insert(
                phase.to_string(),
                states.iter().map(|s| (*s).to_string()).collect(),
            );
        self
    }

    pub fn with_capture_behavior(
        mut self,
        persona_type: &str,
        dist: CategoricalDistribution,
    ) -> Self {
        self.capture_behavior.insert(persona_type.to_string(), dist);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(EngagementTier::from_engagement(0.85), EngagementTier::High);
        assert_eq!(EngagementTier::from_engagement(0.7), EngagementTier::Standard);
        assert_eq!(EngagementTier::from_engagement(0.4), EngagementTier::Standard);
        assert_eq!(EngagementTier::from_engagement(0.1), EngagementTier::Low);
    }

    #[test]
    fn test_candidate_lookup_falls_through() {
        let tables = LookupTables::new().with_emotional_states(
            "seeker",
            "awareness",
            &["curious", "hopeful"],
        );

        assert_eq!(
            tables.emotional_candidates("seeker", "awareness").unwrap().len(),
            2
        );
        assert!(tables.emotional_candidates("seeker", "decision").is_none());
        assert!(tables.emotional_candidates("skeptic", "awareness").is_none());
    }

    #[test]
    fn test_capture_behavior_parse() {
        assert_eq!(
            CaptureBehavior::parse("crisis_driven"),
            Some(CaptureBehavior::CrisisDriven)
        );
        assert_eq!(CaptureBehavior::parse("unknown"), None);
    }
}

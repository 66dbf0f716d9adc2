//! Archetype Templates - Declarative Persona Categories
//!
//! An archetype describes one persona category: its share of the population,
//! the ranges and distributions its attributes are drawn from, and the
//! correlation hints that bias those draws toward each other.

use crate::error::{CohortError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Allowed drift when population weights are summed.
pub const WEIGHT_TOLERANCE: f64 = 0.01;

/// Inclusive bounds for one numeric attribute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttributeRange {
    pub min: f64,
    pub max: f64,
}

impl AttributeRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Clamp a value into the declared bounds.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Position of a value within the range, normalized to [0, 1].
    /// A zero-width range maps everything to the midpoint.
    pub fn normalize(&self, value: f64) -> f64 {
        if self.span() <= f64::EPSILON {
            0.5
        } else {
            ((value - self.min) / self.span()).clamp(0.0, 1.0)
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Direction a categorical option leans when conditioned on a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Leaning {
    High,
    Low,
}

/// One option of a weighted categorical distribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalOption {
    pub value: String,
    pub weight: f64,
    /// Optional tag used when the option set is conditioned on a
    /// continuous driver attribute.
    #[serde(default)]
    pub leaning: Option<Leaning>,
}

/// Weighted categorical distribution over string values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoricalDistribution {
    pub options: Vec<CategoricalOption>,
}

impl CategoricalDistribution {
    pub fn new(options: Vec<CategoricalOption>) -> Self {
        Self { options }
    }

    /// Convenience constructor from (value, weight) pairs.
    pub fn from_pairs(pairs: &[(&str, f64)]) -> Self {
        Self {
            options: pairs
                .iter()
                .map(|(value, weight)| CategoricalOption {
                    value: (*value).to_string(),
                    weight: *weight,
                    leaning: None,
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

/// Declared linear relationship between two attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationHint {
    /// Numeric attribute whose drawn value biases the dependent.
    pub driver: String,
    /// Numeric or categorical attribute receiving the bias.
    pub dependent: String,
    /// Strength and direction in [-1, 1].
    pub coefficient: f64,
}

/// Per-phase completion probability override, `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompletionRange {
    pub min: f64,
    pub max: f64,
}

impl CompletionRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// Immutable declarative template for one persona category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaArchetype {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Share of the population, 0..=1. Shares across a population must
    /// sum to 1 within [`WEIGHT_TOLERANCE`].
    pub weight: f64,
    #[serde(default)]
    pub numeric_attributes: HashMap<String, AttributeRange>,
    #[serde(default)]
    pub categorical_attributes: HashMap<String, CategoricalDistribution>,
    #[serde(default)]
    pub correlations: Vec<CorrelationHint>,
    /// Overrides of the per-phase completion probability, keyed by phase name.
    #[serde(default)]
    pub phase_completion: HashMap<String, CompletionRange>,
}

impl PersonaArchetype {
    /// Structural validation of a single archetype. Cross-archetype checks
    /// (weight sums) live in [`validate_population`].
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(CohortError::config("archetype id cannot be empty"));
        }
        if !(0.0..=1.0).contains(&self.weight) {
            return Err(CohortError::config(format!(
                "archetype '{}': weight {} outside [0, 1]",
                self.id, self.weight
            )));
        }
        for (attr, range) in &self.numeric_attributes {
            if range.min > range.max || !range.min.is_finite() || !range.max.is_finite() {
                return Err(CohortError::config(format!(
                    "archetype '{}': attribute '{}' has invalid range [{}, {}]",
                    self.id, attr, range.min, range.max
                )));
            }
        }
        for (attr, dist) in &self.categorical_attributes {
            if dist.is_empty() {
                return Err(CohortError::config(format!(
                    "archetype '{}': categorical attribute '{}' has no options",
                    self.id, attr
                )));
            }
            if dist.options.iter().any(|o| o.weight < 0.0 || !o.weight.is_finite()) {
                return Err(CohortError::config(format!(
                    "archetype '{}': categorical attribute '{}' has a negative weight",
                    self.id, attr
                )));
            }
            if dist.options.iter().map(|o| o.weight).sum::<f64>() <= 0.0 {
                return Err(CohortError::config(format!(
                    "archetype '{}': categorical attribute '{}' has zero total weight",
                    self.id, attr
                )));
            }
        }
        for hint in &self.correlations {
            if !(-1.0..=1.0).contains(&hint.coefficient) {
                return Err(CohortError::config(format!(
                    "archetype '{}': correlation {}->{} coefficient {} outside [-1, 1]",
                    self.id, hint.driver, hint.dependent, hint.coefficient
                )));
            }
            if !self.numeric_attributes.contains_key(&hint.driver) {
                return Err(CohortError::config(format!(
                    "archetype '{}': correlation driver '{}' is not a declared numeric attribute",
                    self.id, hint.driver
                )));
            }
            let known = self.numeric_attributes.contains_key(&hint.dependent)
                || self.categorical_attributes.contains_key(&hint.dependent);
            if !known {
                return Err(CohortError::config(format!(
                    "archetype '{}': correlation dependent '{}' is not a declared attribute",
                    self.id, hint.dependent
                )));
            }
        }
        for (phase, range) in &self.phase_completion {
            let bounded = (0.0..=1.0).contains(&range.min)
                && (0.0..=1.0).contains(&range.max)
                && range.min <= range.max;
            if !bounded {
                return Err(CohortError::config(format!(
                    "archetype '{}': completion range for phase '{}' invalid: [{}, {}]",
                    self.id, phase, range.min, range.max
                )));
            }
        }
        Ok(())
    }
}

/// Validate a full archetype set: every archetype individually, plus the
/// population weight sum.
pub fn validate_population(archetypes: &[PersonaArchetype]) -> Result<()> {
    if archetypes.is_empty() {
        return Err(CohortError::config("population needs at least one archetype"));
    }
    for archetype in archetypes {
        archetype.validate()?;
    }
    let total: f64 = archetypes.iter().map(|a| a.weight).sum();
    if (total - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(CohortError::validation(format!(
            "archetype weights sum to {total:.4}, expected 1.0 +/- {WEIGHT_TOLERANCE}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal(id: &str, weight: f64) -> PersonaArchetype {
        PersonaArchetype {
            id: id.to_string(),
            name: String::new(),
            description: String::new(),
            weight,
            numeric_attributes: HashMap::new(),
            categorical_attributes: HashMap::new(),
            correlations: Vec::new(),
            phase_completion: HashMap::new(),
        }
    }

    #[test]
    fn test_range_normalize() {
        let range = AttributeRange::new(30.0, 50.0);
        assert_eq!(range.normalize(30.0), 0.0);
        assert_eq!(range.normalize(40.0), 0.5);
        assert_eq!(range.normalize(50.0), 1.0);
        assert_eq!(range.normalize(100.0), 1.0);

        let degenerate = AttributeRange::new(4.0, 4.0);
        assert_eq!(degenerate.normalize(4.0), 0.5);
    }

    #[test]
    fn test_weight_sum_validation() {
        let ok = vec![minimal("a", 0.6), minimal("b", 0.4)];
        assert!(validate_population(&ok).is_ok());

        let slightly_off = vec![minimal("a", 0.6), minimal("b", 0.405)];
        assert!(validate_population(&slightly_off).is_ok());

        let bad = vec![minimal("a", 0.6), minimal("b", 0.6)];
        let err = validate_population(&bad).unwrap_err();
        assert!(matches!(err, CohortError::Validation(_)));
    }

    #[test]
    fn test_correlation_references_checked() {
        let mut archetype = minimal("seeker", 1.0);
        archetype.correlations.push(CorrelationHint {
            driver: "age".to_string(),
            dependent: "engagement".to_string(),
            coefficient: 0.5,
        });
        let err = archetype.validate().unwrap_err();
        assert!(matches!(err, CohortError::Config(_)));

        archetype
            .numeric_attributes
            .insert("age".to_string(), AttributeRange::new(30.0, 50.0));
        archetype
            .numeric_attributes
            .insert("engagement".to_string(), AttributeRange::new(0.0, 1.0));
        assert!(archetype.validate().is_ok());
    }

    #[test]
    fn test_coefficient_bounds() {
        let mut archetype = minimal("seeker", 1.0);
        archetype
            .numeric_attributes
            .insert("age".to_string(), AttributeRange::new(30.0, 50.0));
        archetype.correlations.push(CorrelationHint {
            driver: "age".to_string(),
            dependent: "age".to_string(),
            coefficient: 1.5,
        });
        assert!(archetype.validate().is_err());
    }
}

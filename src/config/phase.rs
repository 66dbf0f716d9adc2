//! Journey Phase Templates
//!
//! Ordered stage definitions shared read-only by every persona in a project.
//! Missing objective or data-field lists degrade to empty defaults at
//! simulation time; only structural problems fail validation.

use crate::error::{CohortError, Result};
use serde::{Deserialize, Serialize};

/// One ordered stage of a journey.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JourneyPhase {
    pub name: String,
    /// What a persona tries to do during this phase. Steps sample 1-3
    /// of these as their recorded actions.
    #[serde(default)]
    pub objectives: Vec<String>,
    /// Data fields "collected" when a step in this phase runs.
    #[serde(default)]
    pub data_fields: Vec<String>,
    /// Default completion probability when the persona declares no
    /// override for this phase.
    pub completion_threshold: f64,
}

impl JourneyPhase {
    pub fn new(name: impl Into<String>, completion_threshold: f64) -> Self {
        Self {
            name: name.into(),
            objectives: Vec::new(),
            data_fields: Vec::new(),
            completion_threshold,
        }
    }

    pub fn with_objectives(mut self, objectives: &[&str]) -> Self {
        self.objectives = objectives.iter().map(|o| (*o).to_string()).collect();
        self
    }

    pub fn with_data_fields(mut self, fields: &[&str]) -> Self {
        self.data_fields = fields.iter().map(|f| (*f).to_string()).collect();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(CohortError::config("phase name cannot be empty"));
        }
        if !(0.0..=1.0).contains(&self.completion_threshold) {
            return Err(CohortError::config(format!(
                "phase '{}': completion threshold {} outside [0, 1]",
                self.name, self.completion_threshold
            )));
        }
        Ok(())
    }
}

/// Validate an ordered phase plan: each phase individually plus name
/// uniqueness, so persona overrides resolve unambiguously.
pub fn validate_phases(phases: &[JourneyPhase]) -> Result<()> {
    if phases.is_empty() {
        return Err(CohortError::config("journey needs at least one phase"));
    }
    for phase in phases {
        phase.validate()?;
    }
    for (i, phase) in phases.iter().enumerate() {
        if phases[..i].iter().any(|p| p.name == phase.name) {
            return Err(CohortError::config(format!(
                "duplicate phase name '{}'",
                phase.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_validation() {
        let phase = JourneyPhase::new("awareness", 0.7)
            .with_objectives(&["read intro", "browse features"]);
        assert!(phase.validate().is_ok());

        let bad = JourneyPhase::new("awareness", 1.2);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let phases = vec![
            JourneyPhase::new("awareness", 0.7),
            JourneyPhase::new("awareness", 0.5),
        ];
        assert!(validate_phases(&phases).is_err());
    }

    #[test]
    fn test_empty_objectives_allowed() {
        // Partially-authored phases are common; they degrade at simulation
        // time instead of failing here.
        let phases = vec![JourneyPhase::new("onboarding", 0.8)];
        assert!(validate_phases(&phases).is_ok());
    }
}

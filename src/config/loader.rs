//! Config Loading - JSON Declarations From Disk
//!
//! Thin file layer over the declarative structures. Parsing and validation
//! fail fast before any generation starts; the structures themselves stay
//! serialization-agnostic.

use crate::config::archetype::{validate_population, PersonaArchetype};
use crate::config::lookup::LookupTables;
use crate::config::phase::{validate_phases, JourneyPhase};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Loader for archetype, phase and lookup declarations.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate a full archetype population from one JSON file
    /// containing an array of archetypes.
    pub fn load_archetypes(path: impl AsRef<Path>) -> Result<Vec<PersonaArchetype>> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading archetypes from {}", path.display()))?;
        let archetypes: Vec<PersonaArchetype> = serde_json::from_str(&content)
            .with_context(|| format!("parsing archetypes from {}", path.display()))?;
        validate_population(&archetypes)?;
        Ok(archetypes)
    }

    /// Load every `*.json` archetype in a directory, one archetype per file.
    pub fn load_archetype_dir(dir: impl AsRef<Path>) -> Result<Vec<PersonaArchetype>> {
        let dir = dir.as_ref();
        let mut archetypes = Vec::new();

        for entry in fs::read_dir(dir)
            .with_context(|| format!("reading archetype directory {}", dir.display()))?
        {
            let path = entry?.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                let content = fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?;
                let archetype: PersonaArchetype = serde_json::from_str(&content)
                    .with_context(|| format!("parsing {}", path.display()))?;
                archetypes.push(archetype);
            }
        }

        archetypes.sort_by(|a, b| a.id.cmp(&b.id));
        validate_population(&archetypes)?;
        Ok(archetypes)
    }

    /// Load and validate an ordered phase plan.
    pub fn load_phases(path: impl AsRef<Path>) -> Result<Vec<JourneyPhase>> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading phases from {}", path.display()))?;
        let phases: Vec<JourneyPhase> = serde_json::from_str(&content)
            .with_context(|| format!("parsing phases from {}", path.display()))?;
        validate_phases(&phases)?;
        Ok(phases)
    }

    /// Load lookup tables; a missing file yields empty tables, since every
    /// consumer has a documented fallback.
    pub fn load_lookups(path: impl AsRef<Path>) -> Result<LookupTables> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(LookupTables::new());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading lookup tables from {}", path.display()))?;
        let tables: LookupTables = serde_json::from_str(&content)
            .with_context(|| format!("parsing lookup tables from {}", path.display()))?;
        Ok(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archetypes_roundtrip_through_json() {
        let json = r#"[
            {
                "id": "seeker",
                "weight": 1.0,
                "numeric_attributes": {
                    "age": { "min": 30.0, "max": 50.0 },
                    "engagement": { "min": 0.0, "max": 1.0 }
                },
                "correlations": [
                    { "driver": "age", "dependent": "engagement", "coefficient": 0.6 }
                ],
                "phase_completion": {
                    "awareness": { "min": 0.6, "max": 0.9 }
                }
            }
        ]"#;

        let archetypes: Vec<PersonaArchetype> = serde_json::from_str(json).unwrap();
        assert!(validate_population(&archetypes).is_ok());
        assert_eq!(archetypes[0].correlations.len(), 1);
        assert!(archetypes[0].phase_completion.contains_key("awareness"));
    }

    #[test]
    fn test_weight_sum_rejected_at_load() {
        let json = r#"[
            { "id": "a", "weight": 0.5 },
            { "id": "b", "weight": 0.3 }
        ]"#;
        let archetypes: Vec<PersonaArchetype> = serde_json::from_str(json).unwrap();
        assert!(validate_population(&archetypes).is_err());
    }

    #[test]
    fn test_lookup_tables_parse() {
        let json = r#"{
            "emotional_states": {
                "seeker": { "awareness": ["curious", "hopeful"] }
            },
            "capture_behavior": {
                "seeker": { "options": [
                    { "value": "systematic", "weight": 2.0 },
                    { "value": "opportunistic", "weight": 1.0 }
                ] }
            }
        }"#;
        let tables: LookupTables = serde_json::from_str(json).unwrap();
        assert!(tables.emotional_candidates("seeker", "awareness").is_some());
        assert!(tables.capture_distribution("seeker").is_some());
    }
}

//! Rating Scale Definitions
//!
//! An SSR scale is an ordinal 1-5 scale where every point carries one
//! canonical reference statement. Quantization measures an utterance
//! against those five anchors.

use crate::error::{CohortError, Result};
use serde::{Deserialize, Serialize};

/// Number of points every scale must declare.
pub const SCALE_POINTS: usize = 5;

/// One point of a rating scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalePoint {
    /// Ordinal value, 1..=5.
    pub value: u8,
    /// Canonical reference statement for this rating.
    pub anchor: String,
}

/// Named ordinal scale with exactly five anchored points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaleDefinition {
    pub id: String,
    pub points: Vec<ScalePoint>,
}

impl ScaleDefinition {
    /// Build a scale from five anchor statements ordered 1..=5.
    pub fn from_anchors(id: impl Into<String>, anchors: [&str; SCALE_POINTS]) -> Self {
        Self {
            id: id.into(),
            points: anchors
                .iter()
                .enumerate()
                .map(|(i, anchor)| ScalePoint {
                    value: (i + 1) as u8,
                    anchor: (*anchor).to_string(),
                })
                .collect(),
        }
    }

    /// Check the scale covers exactly points {1, 2, 3, 4, 5} with
    /// non-empty anchors.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(CohortError::validation("scale id cannot be empty"));
        }
        if self.points.len() != SCALE_POINTS {
            return Err(CohortError::validation(format!(
                "scale '{}': expected {} points, found {}",
                self.id,
                SCALE_POINTS,
                self.points.len()
            )));
        }

        let mut seen = [false; SCALE_POINTS];
        for point in &self.points {
            if !(1..=SCALE_POINTS as u8).contains(&point.value) {
                return Err(CohortError::validation(format!(
                    "scale '{}': point value {} outside 1..=5",
                    self.id, point.value
                )));
            }
            let slot = (point.value - 1) as usize;
            if seen[slot] {
                return Err(CohortError::validation(format!(
                    "scale '{}': duplicate point {}",
                    self.id, point.value
                )));
            }
            seen[slot] = true;
            if point.anchor.trim().is_empty() {
                return Err(CohortError::validation(format!(
                    "scale '{}': point {} has an empty anchor statement",
                    self.id, point.value
                )));
            }
        }
        Ok(())
    }

    /// Anchor statements ordered by point value 1..=5. Only valid after
    /// [`validate`](Self::validate).
    pub fn ordered_anchors(&self) -> Vec<&str> {
        let mut points: Vec<&ScalePoint> = self.points.iter().collect();
        points.sort_by_key(|p| p.value);
        points.iter().map(|p| p.anchor.as_str()).collect()
    }
}

/// A ready-made agreement scale, the most common survey case.
pub fn agreement_scale() -> ScaleDefinition {
    ScaleDefinition::from_anchors(
        "agreement",
        [
            "I strongly disagree with this statement",
            "I somewhat disagree with this statement",
            "I neither agree nor disagree with this statement",
            "I somewhat agree with this statement",
            "I strongly agree with this statement",
        ],
    )
}

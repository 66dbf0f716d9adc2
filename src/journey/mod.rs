//! Journey - Simulated Usage History
//!
//! A journey is the ordered, append-only record of one persona's simulated
//! touch-points. Sequence numbers and timestamps are owned by the journey
//! itself, so a stored journey can never go backwards in time.

pub mod simulator;
pub mod strategy;

pub use simulator::{JourneyRun, JourneySimulator};
pub use strategy::{MilestoneConfig, ProgressionStrategy, TimeBasedConfig};

use crate::ssr::ResponsePmf;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Completion fraction at which a journey counts as finished.
pub const COMPLETION_DONE: f64 = 0.9;

/// Outcome classification of one simulated step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Completed,
    InProgress,
    Abandoned,
}

/// One simulated touch-point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Name of the phase this step ran in.
    pub phase: String,
    /// 1-based position in the journey; assigned on append.
    pub step_number: u32,
    pub timestamp: DateTime<Utc>,
    pub emotional_state: String,
    pub status: StepStatus,
    /// Minutes spent, bounded to [5, 60].
    pub time_invested_minutes: f64,
    pub engagement_score: f64,
    /// Objectives acted on during this step (1-3, without replacement).
    pub actions: Vec<String>,
    /// Data fields collected, copied from the phase template.
    pub captured_fields: Vec<String>,
    /// Optional semantic-similarity enrichment.
    #[serde(default)]
    pub enrichment: Option<ResponsePmf>,
}

/// Ordered usage history for one persona.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Journey {
    pub id: Uuid,
    pub persona_id: Uuid,
    steps: Vec<Step>,
    /// Number of steps the simulation planned up front; fixed so the
    /// completion fraction can only grow.
    planned_steps: usize,
    completed_steps: usize,
    pub last_activity: Option<DateTime<Utc>>,
    /// Set once the completion fraction first reaches [`COMPLETION_DONE`].
    pub completed_at: Option<DateTime<Utc>>,
}

impl Journey {
    pub fn new(persona_id: Uuid, planned_steps: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            persona_id,
            steps: Vec::new(),
            planned_steps,
            completed_steps: 0,
            last_activity: None,
            completed_at: None,
        }
    }

    /// Append a step, assigning its sequence number and clamping its
    /// timestamp so the journey stays monotone.
    pub fn append(&mut self, mut step: Step) {
        step.step_number = self.steps.len() as u32 + 1;
        if let Some(last) = self.steps.last() {
            if step.timestamp < last.timestamp {
                step.timestamp = last.timestamp;
            }
        }
        if step.status == StepStatus::Completed {
            self.completed_steps += 1;
        }
        self.last_activity = Some(step.timestamp);
        if self.completed_at.is_none() && self.completion() >= COMPLETION_DONE {
            self.completed_at = Some(step.timestamp);
        }
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn planned_steps(&self) -> usize {
        self.planned_steps
    }

    /// Fraction of planned steps completed so far; monotone non-decreasing
    /// because the plan is fixed and completions only accumulate. Retried
    /// phases can complete more steps than planned, so the fraction caps
    /// at 1.0.
    pub fn completion(&self) -> f64 {
        if self.planned_steps == 0 {
            return 0.0;
        }
        (self.completed_steps as f64 / self.planned_steps as f64).min(1.0)
    }

    /// Attach an enrichment PMF to the step at `index`, if it exists.
    pub fn enrich_step(&mut self, index: usize, pmf: ResponsePmf) {
        if let Some(step) = self.steps.get_mut(index) {
            step.enrichment = Some(pmf);
        }
    }
}

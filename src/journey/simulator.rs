//! Journey Progression Simulator
//!
//! A stochastic state machine advancing one persona through the shared
//! phase plan under the strategy chosen at construction. Malformed phase
//! content never aborts a bulk run; it degrades to empty defaults and is
//! counted on the way out.

use crate::cohort::Persona;
use crate::config::{
    validate_phases, EngagementTier, JourneyPhase, LookupTables, DEFAULT_EMOTIONAL_STATE,
};
use crate::error::Result;
use crate::journey::strategy::{
    session_count, session_interval_days, tier_completion_modifier, MilestoneConfig,
    ProgressionStrategy, TimeBasedConfig, LOW_TIER_DROPOUT, LOW_TIER_DROPOUT_FROM,
};
use crate::journey::{Journey, Step, StepStatus};
use chrono::{DateTime, Duration, Utc};
use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::debug;

/// Share of non-completed steps that are abandoned outright rather than
/// left in progress.
const ABANDON_PROBABILITY: f64 = 0.10;

/// Time-invested distribution: normal(15, 5) minutes, clamped to [5, 60].
const TIME_MEAN_MINUTES: f64 = 15.0;
const TIME_STDDEV_MINUTES: f64 = 5.0;
const TIME_MIN_MINUTES: f64 = 5.0;
const TIME_MAX_MINUTES: f64 = 60.0;

/// Result of simulating one journey.
#[derive(Debug, Clone)]
pub struct JourneyRun {
    pub journey: Journey,
    /// Documented fallbacks hit along the way (missing emotional-state
    /// candidates, empty objective lists).
    pub degraded_events: u32,
}

/// Simulates journeys for any persona against one shared phase plan.
pub struct JourneySimulator {
    phases: Vec<JourneyPhase>,
    lookups: LookupTables,
    strategy: ProgressionStrategy,
    start_time: DateTime<Utc>,
}

impl JourneySimulator {
    pub fn new(
        phases: Vec<JourneyPhase>,
        lookups: LookupTables,
        strategy: ProgressionStrategy,
        start_time: DateTime<Utc>,
    ) -> Result<Self> {
        validate_phases(&phases)?;
        Ok(Self {
            phases,
            lookups,
            strategy,
            start_time,
        })
    }

    pub fn phases(&self) -> &[JourneyPhase] {
        &self.phases
    }

    /// Simulate one journey. Deterministic for a given random stream.
    pub fn simulate(&self, persona: &Persona, rng: &mut SmallRng) -> JourneyRun {
        let run = match self.strategy {
            ProgressionStrategy::TimeBased(cfg) => self.run_time_based(persona, rng, cfg),
            ProgressionStrategy::SessionBased => self.run_session_based(persona, rng),
            ProgressionStrategy::MilestoneBased(cfg) => self.run_milestone_based(persona, rng, cfg),
        };

        debug!(
            persona = %persona.id,
            steps = run.journey.len(),
            completion = run.journey.completion(),
            degraded = run.degraded_events,
            "journey simulated"
        );
        run
    }

    /// Fixed cadence: one step per phase, dropout after incomplete steps.
    fn run_time_based(
        &self,
        persona: &Persona,
        rng: &mut SmallRng,
        cfg: TimeBasedConfig,
    ) -> JourneyRun {
        let mut journey = Journey::new(persona.id, self.phases.len());
        let mut degraded = 0;
        let mut now = self.start_time;

        for phase in &self.phases {
            let step = self.build_step(rng, persona, phase, now, 0.0, &mut degraded);
            let status = step.status;
            journey.append(step);

            if status != StepStatus::Completed && rng.random_bool(cfg.dropout_probability) {
                break;
            }
            now += days(cfg.cadence_days);
        }

        JourneyRun {
            journey,
            degraded_events: degraded,
        }
    }

    /// Session count from engagement tier, intervals from capture
    /// behavior, sessions spread evenly over the phase plan.
    fn run_session_based(&self, persona: &Persona, rng: &mut SmallRng) -> JourneyRun {
        let total = session_count(rng, persona.engagement_tier);
        let modifier = tier_completion_modifier(persona.engagement_tier);
        let mut journey = Journey::new(persona.id, total);
        let mut degraded = 0;
        let mut now = self.start_time;

        for session in 0..total {
            // From session 4 onward, low-tier personas may simply not
            // come back.
            if persona.engagement_tier == EngagementTier::Low
                && session >= LOW_TIER_DROPOUT_FROM
                && rng.random_bool(LOW_TIER_DROPOUT)
            {
                break;
            }

            let phase_idx = (session * self.phases.len() / total).min(self.phases.len() - 1);
            let phase = &self.phases[phase_idx];
            let step = self.build_step(rng, persona, phase, now, modifier, &mut degraded);
            journey.append(step);

            now += days(session_interval_days(rng, persona.capture_behavior, session));
        }

        JourneyRun {
            journey,
            degraded_events: degraded,
        }
    }

    /// Bounded retries per phase until a completed step passes the
    /// advance gate; exhausted phases are moved past, not fatal.
    fn run_milestone_based(
        &self,
        persona: &Persona,
        rng: &mut SmallRng,
        cfg: MilestoneConfig,
    ) -> JourneyRun {
        let mut journey = Journey::new(persona.id, self.phases.len());
        let mut degraded = 0;
        let mut now = self.start_time;

        for phase in &self.phases {
            for _attempt in 0..cfg.max_attempts.max(1) {
                let step = self.build_step(rng, persona, phase, now, 0.0, &mut degraded);
                let status = step.status;
                journey.append(step);
                now += days(rng.random_range(1.0..=4.0));

                if status == StepStatus::Completed && rng.random_bool(cfg.advance_probability) {
                    break;
                }
            }
        }

        JourneyRun {
            journey,
            degraded_events: degraded,
        }
    }

    /// Shared step construction across strategies.
    fn build_step(
        &self,
        rng: &mut SmallRng,
        persona: &Persona,
        phase: &JourneyPhase,
        timestamp: DateTime<Utc>,
        completion_modifier: f64,
        degraded: &mut u32,
    ) -> Step {
        let emotional_state = match self
            .lookups
            .emotional_candidates(persona.persona_type(), &phase.name)
        {
            Some(candidates) => candidates
                .choose(rng)
                .cloned()
                .unwrap_or_else(|| DEFAULT_EMOTIONAL_STATE.to_string()),
            None => {
                *degraded += 1;
                DEFAULT_EMOTIONAL_STATE.to_string()
            }
        };

        let actions = if phase.objectives.is_empty() {
            *degraded += 1;
            Vec::new()
        } else {
            let k = rng.random_range(1..=3).min(phase.objectives.len());
            phase.objectives.choose_multiple(rng, k).cloned().collect()
        };

        let completion_probability =
            (self.completion_probability(persona, phase, rng) + completion_modifier).clamp(0.0, 1.0);
        let status = if rng.random_range(0.0..1.0) < completion_probability {
            StepStatus::Completed
        } else if rng.random_bool(ABANDON_PROBABILITY) {
            StepStatus::Abandoned
        } else {
            StepStatus::InProgress
        };

        Step {
            phase: phase.name.clone(),
            step_number: 0,
            timestamp,
            emotional_state,
            status,
            time_invested_minutes: bounded_normal(
                rng,
                TIME_MEAN_MINUTES,
                TIME_STDDEV_MINUTES,
                TIME_MIN_MINUTES,
                TIME_MAX_MINUTES,
            ),
            engagement_score: persona.base_engagement() * rng.random_range(0.7..=1.0),
            actions,
            captured_fields: phase.data_fields.clone(),
            enrichment: None,
        }
    }

    /// Persona override range for the phase when declared, otherwise the
    /// phase's own threshold.
    fn completion_probability(
        &self,
        persona: &Persona,
        phase: &JourneyPhase,
        rng: &mut SmallRng,
    ) -> f64 {
        match persona.completion_range(&phase.name) {
            Some(range) if range.max > range.min => rng.random_range(range.min..=range.max),
            Some(range) => range.min,
            None => phase.completion_threshold,
        }
    }
}

/// Fractional days as a chrono duration.
fn days(amount: f64) -> Duration {
    Duration::seconds((amount * 86_400.0) as i64)
}

/// Box-Muller normal draw, clamped.
fn bounded_normal(rng: &mut SmallRng, mean: f64, std_dev: f64, min: f64, max: f64) -> f64 {
    let u1: f64 = rng.random_range(f64::MIN_POSITIVE..1.0);
    let u2: f64 = rng.random_range(0.0..1.0);
    let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
    (mean + std_dev * z).clamp(min, max)
}

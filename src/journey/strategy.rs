//! Progression Strategies
//!
//! One simulator, three interchangeable progression rules chosen at
//! construction. The strategy decides how many steps a journey gets, how
//! far apart they land, and which extra dropout checks apply; step
//! construction itself is shared.

use crate::config::{CaptureBehavior, EngagementTier};
use rand::rngs::SmallRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Completion probability shift applied by engagement tier under the
/// session-based strategy.
pub const HIGH_TIER_BOOST: f64 = 0.15;
pub const LOW_TIER_PENALTY: f64 = -0.15;

/// Extra dropout probability low-tier personas face from session 4 onward.
pub const LOW_TIER_DROPOUT: f64 = 0.15;
/// Zero-based session index from which the extra check applies.
pub const LOW_TIER_DROPOUT_FROM: usize = 3;

/// Parameters of the fixed-cadence strategy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimeBasedConfig {
    /// Days between consecutive steps.
    pub cadence_days: f64,
    /// Chance of quitting after an incomplete step.
    pub dropout_probability: f64,
}

impl Default for TimeBasedConfig {
    fn default() -> Self {
        Self {
            cadence_days: 7.0,
            dropout_probability: 0.15,
        }
    }
}

/// Parameters of the milestone strategy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MilestoneConfig {
    /// Attempts allowed per phase before moving on regardless.
    pub max_attempts: u32,
    /// Independent gate a completed step must still pass to advance.
    pub advance_probability: f64,
}

impl Default for MilestoneConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            advance_probability: 0.8,
        }
    }
}

/// Progression rule selected when the simulator is built.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ProgressionStrategy {
    /// Fixed cadence per phase, dropout after incomplete steps.
    TimeBased(TimeBasedConfig),
    /// Session count driven by engagement tier, intervals by capture
    /// behavior.
    SessionBased,
    /// Bounded retries per phase until a completed step passes the
    /// advance gate.
    MilestoneBased(MilestoneConfig),
}

impl ProgressionStrategy {
    pub fn time_based() -> Self {
        Self::TimeBased(TimeBasedConfig::default())
    }

    pub fn session_based() -> Self {
        Self::SessionBased
    }

    pub fn milestone_based() -> Self {
        Self::MilestoneBased(MilestoneConfig::default())
    }
}

/// Session count for one journey under the session-based strategy.
pub fn session_count(rng: &mut SmallRng, tier: EngagementTier) -> usize {
    match tier {
        EngagementTier::High => rng.random_range(15..=25),
        EngagementTier::Low => rng.random_range(5..=12),
        EngagementTier::Standard => rng.random_range(10..=20),
    }
}

/// Completion probability shift for a tier under the session-based
/// strategy.
pub fn tier_completion_modifier(tier: EngagementTier) -> f64 {
    match tier {
        EngagementTier::High => HIGH_TIER_BOOST,
        EngagementTier::Low => LOW_TIER_PENALTY,
        EngagementTier::Standard => 0.0,
    }
}

/// Days until the next session, shaped by capture behavior.
///
/// Crisis-driven personas burst: within each group of five sessions, three
/// short gaps (1-3 days) are followed by two long ones (10-30 days).
pub fn session_interval_days(
    rng: &mut SmallRng,
    behavior: CaptureBehavior,
    session_index: usize,
) -> f64 {
    match behavior {
        CaptureBehavior::Systematic => rng.random_range(6.0..=8.0),
        CaptureBehavior::Opportunistic => rng.random_range(2.0..=14.0),
        CaptureBehavior::CrisisDriven => {
            if session_index % 5 < 3 {
                rng.random_range(1.0..=3.0)
            } else {
                rng.random_range(10.0..=30.0)
            }
        }
        CaptureBehavior::Experimental => rng.random_range(1.0..=28.0),
    }
}

//! Attribute Correlation Sampler
//!
//! Turns archetype declarations into concrete personas: proportional
//! allocation across archetypes, per-attribute draws, and the linear
//! correlation blend that biases dependents toward their drivers.
//!
//! The correlation mechanism is a linear approximation, not a joint
//! distribution: the driver's normalized position pulls the dependent
//! toward the matching end of its own range, weighted by |coefficient|.
//! For uniform draws the blend realizes a Pearson correlation of about
//! `c / sqrt(c^2 + (1-c)^2)`, which overshoots mid-range coefficients and
//! converges on the declared value as |c| approaches 1.

use crate::cohort::persona::{Persona, DEFAULT_ENGAGEMENT, ENGAGEMENT_ATTRIBUTE};
use crate::config::{
    validate_population, CaptureBehavior, CategoricalOption, CorrelationHint, EngagementTier,
    Leaning, LookupTables, PersonaArchetype,
};
use crate::error::{CohortError, Result};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;

/// Driver position above which high-leaning options are favored.
const DRIVER_HIGH: f64 = 0.7;
/// Driver position below which low-leaning options are favored.
const DRIVER_LOW: f64 = 0.4;
/// Weight multiplier applied to favored options.
const LEANING_BOOST: f64 = 3.0;

/// Split a requested cohort size across archetypes by declared weight,
/// using the largest-remainder method: counts sum exactly to `count` and
/// no archetype drifts by more than one from its ideal float share.
pub fn allocate(count: usize, archetypes: &[PersonaArchetype]) -> Result<Vec<usize>> {
    validate_population(archetypes)?;

    let total_weight: f64 = archetypes.iter().map(|a| a.weight).sum();
    let ideals: Vec<f64> = archetypes
        .iter()
        .map(|a| a.weight / total_weight * count as f64)
        .collect();

    let mut counts: Vec<usize> = ideals.iter().map(|i| i.floor() as usize).collect();
    let assigned: usize = counts.iter().sum();
    let mut remainder = count.saturating_sub(assigned);

    // Hand out the leftover seats by largest fractional part, index order
    // breaking ties so the result is stable.
    let mut order: Vec<usize> = (0..archetypes.len()).collect();
    order.sort_by(|&a, &b| {
        let fa = ideals[a] - ideals[a].floor();
        let fb = ideals[b] - ideals[b].floor();
        fb.partial_cmp(&fa).unwrap_or(std::cmp::Ordering::Equal).then(a.cmp(&b))
    });

    for &idx in &order {
        if remainder == 0 {
            break;
        }
        counts[idx] += 1;
        remainder -= 1;
    }

    Ok(counts)
}

/// Sample a full cohort: allocate by weight, draw each persona, then
/// shuffle so archetype blocks do not survive into the output order.
pub fn sample_personas(
    seed: u64,
    count: usize,
    archetypes: &[PersonaArchetype],
    lookups: &LookupTables,
) -> Result<Vec<Persona>> {
    let counts = allocate(count, archetypes)?;
    let mut rng = SmallRng::seed_from_u64(seed);

    let mut personas = Vec::with_capacity(count);
    for (archetype, n) in archetypes.iter().zip(counts.iter()) {
        for _ in 0..*n {
            personas.push(draw_persona(&mut rng, archetype, lookups)?);
        }
    }
    personas.shuffle(&mut rng);
    Ok(personas)
}

/// Draw one persona from an archetype using the provided random stream.
pub fn draw_persona(
    rng: &mut SmallRng,
    archetype: &PersonaArchetype,
    lookups: &LookupTables,
) -> Result<Persona> {
    archetype.validate()?;

    // Sorted attribute order keeps draws reproducible for a given seed.
    let mut numeric = HashMap::new();
    let mut numeric_names: Vec<&String> = archetype.numeric_attributes.keys().collect();
    numeric_names.sort();
    for name in numeric_names {
        let range = &archetype.numeric_attributes[name];
        let value = if range.span() <= f64::EPSILON {
            range.min
        } else {
            rng.random_range(range.min..=range.max)
        };
        numeric.insert(name.clone(), value);
    }

    let mut categorical = HashMap::new();
    let mut categorical_names: Vec<&String> = archetype.categorical_attributes.keys().collect();
    categorical_names.sort();
    for name in categorical_names {
        let dist = &archetype.categorical_attributes[name];
        let option = weighted_choice(rng, &dist.options, |o| o.weight).ok_or_else(|| {
            CohortError::config(format!(
                "archetype '{}': attribute '{}' has no drawable option",
                archetype.id, name
            ))
        })?;
        categorical.insert(name.clone(), option.value.clone());
    }

    for hint in &archetype.correlations {
        apply_correlation(rng, archetype, hint, &mut numeric, &mut categorical)?;
    }

    let engagement = numeric
        .get(ENGAGEMENT_ATTRIBUTE)
        .copied()
        .unwrap_or(DEFAULT_ENGAGEMENT);

    Ok(Persona {
        id: Uuid::new_v4(),
        archetype_id: archetype.id.clone(),
        numeric,
        categorical,
        engagement_tier: EngagementTier::from_engagement(engagement),
        capture_behavior: draw_capture_behavior(rng, &archetype.id, lookups),
        phase_completion: archetype.phase_completion.clone(),
    })
}

/// Blend one correlation hint into the already-drawn attributes.
fn apply_correlation(
    rng: &mut SmallRng,
    archetype: &PersonaArchetype,
    hint: &CorrelationHint,
    numeric: &mut HashMap<String, f64>,
    categorical: &mut HashMap<String, String>,
) -> Result<()> {
    let driver_range = archetype.numeric_attributes.get(&hint.driver).ok_or_else(|| {
        CohortError::config(format!(
            "archetype '{}': correlation driver '{}' missing bounds",
            archetype.id, hint.driver
        ))
    })?;
    let driver_value = *numeric.get(&hint.driver).ok_or_else(|| {
        CohortError::config(format!(
            "archetype '{}': correlation driver '{}' was never drawn",
            archetype.id, hint.driver
        ))
    })?;

    let mut position = driver_range.normalize(driver_value);
    if hint.coefficient < 0.0 {
        position = 1.0 - position;
    }
    let strength = hint.coefficient.abs();

    if let Some(dep_range) = archetype.numeric_attributes.get(&hint.dependent) {
        let base = numeric[&hint.dependent];
        let target = dep_range.min + position * dep_range.span();
        let blended = base * (1.0 - strength) + target * strength;
        numeric.insert(hint.dependent.clone(), dep_range.clamp(blended));
        return Ok(());
    }

    if let Some(dist) = archetype.categorical_attributes.get(&hint.dependent) {
        let option = weighted_choice(rng, &dist.options, |o| {
            o.weight * leaning_factor(o.leaning, position)
        })
        .ok_or_else(|| {
            CohortError::config(format!(
                "archetype '{}': attribute '{}' has no drawable option",
                archetype.id, hint.dependent
            ))
        })?;
        categorical.insert(hint.dependent.clone(), option.value.clone());
        return Ok(());
    }

    Err(CohortError::config(format!(
        "archetype '{}': correlation dependent '{}' is not a declared attribute",
        archetype.id, hint.dependent
    )))
}

/// Conditioning multiplier for a categorical option given the driver's
/// normalized position.
fn leaning_factor(leaning: Option<Leaning>, position: f64) -> f64 {
    match leaning {
        Some(Leaning::High) if position > DRIVER_HIGH => LEANING_BOOST,
        Some(Leaning::Low) if position < DRIVER_LOW => LEANING_BOOST,
        _ => 1.0,
    }
}

/// Cumulative-weight draw over categorical options. Returns `None` when the
/// effective weights cannot form a distribution.
fn weighted_choice<'a, F>(
    rng: &mut SmallRng,
    options: &'a [CategoricalOption],
    weight_fn: F,
) -> Option<&'a CategoricalOption>
where
    F: Fn(&CategoricalOption) -> f64,
{
    let total: f64 = options.iter().map(&weight_fn).sum();
    if options.is_empty() || total <= 0.0 || !total.is_finite() {
        return None;
    }

    let mut remaining = rng.random_range(0.0..total);
    for option in options {
        remaining -= weight_fn(option);
        if remaining < 0.0 {
            return Some(option);
        }
    }
    options.last()
}

/// Resolve the capture-behavior label from the lookup distribution for a
/// persona type, falling back to opportunistic when the table is silent.
fn draw_capture_behavior(
    rng: &mut SmallRng,
    persona_type: &str,
    lookups: &LookupTables,
) -> CaptureBehavior {
    let Some(dist) = lookups.capture_distribution(persona_type) else {
        return CaptureBehavior::Opportunistic;
    };

    if let Some(option) = weighted_choice(rng, &dist.options, |o| o.weight) {
        if let Some(behavior) = CaptureBehavior::parse(&option.value) {
            return behavior;
        }
        warn!(
            persona_type,
            value = %option.value,
            "unknown capture behavior in lookup table, using opportunistic"
        );
    }
    CaptureBehavior::Opportunistic
}

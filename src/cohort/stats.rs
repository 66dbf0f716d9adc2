//! Empirical Statistics Over Sampled Cohorts
//!
//! The sampler's correlation blend is an approximation; these helpers
//! measure what a cohort actually looks like so declared coefficients can
//! be checked against reality.

use crate::cohort::persona::Persona;
use crate::config::PersonaArchetype;

/// Pearson correlation over two equal-length samples. `None` when fewer
/// than two points or either side has zero variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }

    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys.iter()) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x <= f64::EPSILON || var_y <= f64::EPSILON {
        return None;
    }
    Some(cov / (var_x * var_y).sqrt())
}

/// Empirical correlation between two numeric attributes across a cohort.
/// Personas missing either attribute are skipped.
pub fn measure_correlation(personas: &[Persona], driver: &str, dependent: &str) -> Option<f64> {
    let mut xs = Vec::with_capacity(personas.len());
    let mut ys = Vec::with_capacity(personas.len());
    for persona in personas {
        if let (Some(x), Some(y)) = (persona.numeric(driver), persona.numeric(dependent)) {
            xs.push(x);
            ys.push(y);
        }
    }
    pearson(&xs, &ys)
}

/// Result of checking one declared correlation against a sampled cohort.
#[derive(Debug, Clone)]
pub struct CorrelationCheck {
    pub driver: String,
    pub dependent: String,
    pub declared: f64,
    pub measured: Option<f64>,
}

impl CorrelationCheck {
    /// Whether the measured coefficient landed within `tolerance` of the
    /// declared one. Unmeasurable pairs (categorical dependents, zero
    /// variance) are treated as passing.
    pub fn within(&self, tolerance: f64) -> bool {
        match self.measured {
            Some(measured) => (measured - self.declared).abs() <= tolerance,
            None => true,
        }
    }
}

/// Measure every numeric-to-numeric correlation an archetype declares
/// against the personas drawn from it.
pub fn check_correlations(
    archetype: &PersonaArchetype,
    personas: &[Persona],
) -> Vec<CorrelationCheck> {
    archetype
        .correlations
        .iter()
        .filter(|hint| archetype.numeric_attributes.contains_key(&hint.dependent))
        .map(|hint| CorrelationCheck {
            driver: hint.driver.clone(),
            dependent: hint.dependent.clone(),
            declared: hint.coefficient,
            measured: measure_correlation(personas, &hint.driver, &hint.dependent),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pearson_perfect_line() {
        let xs: Vec<f64> = (0..10).map(f64::from).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 2.0 * x + 1.0).collect();
        let r = pearson(&xs, &ys).unwrap();
        assert!((r - 1.0).abs() < 1e-12);

        let neg: Vec<f64> = xs.iter().map(|x| -x).collect();
        let r = pearson(&xs, &neg).unwrap();
        assert!((r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_degenerate_inputs() {
        assert!(pearson(&[1.0], &[2.0]).is_none());
        assert!(pearson(&[1.0, 2.0], &[3.0]).is_none());
        assert!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_none());
    }
}

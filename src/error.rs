//! Error taxonomy shared across the crate.
//!
//! Three failure classes propagate to callers: malformed declarations,
//! semantic validation failures, and per-call key misses. Everything else
//! degrades to documented fallbacks inside the component that hit it.

use thiserror::Error;

/// Typed errors surfaced by configuration loading, sampling and quantization.
#[derive(Debug, Clone, Error)]
pub enum CohortError {
    /// Malformed or missing archetype/phase declaration. Raised before any
    /// generation starts; not recoverable locally.
    #[error("config error: {0}")]
    Config(String),

    /// Semantic check failed at load time (weight sums, scale shape).
    #[error("validation error: {0}")]
    Validation(String),

    /// Unknown scale, persona or phase key at lookup. Callers may skip the
    /// affected cohort member and continue.
    #[error("not found: {0}")]
    NotFound(String),
}

impl CohortError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, CohortError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CohortError::config("archetype 'seeker' has no weight");
        assert_eq!(
            err.to_string(),
            "config error: archetype 'seeker' has no weight"
        );

        let err = CohortError::not_found("scale 'agreement'");
        assert!(err.to_string().starts_with("not found"));
    }
}

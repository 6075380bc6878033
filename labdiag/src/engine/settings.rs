//! Numeric settings for condition evaluation.

use serde::{Deserialize, Serialize};

/// Absolute tolerance used by `=` and `!=` (measurement noise floor).
pub const COMPARISON_TOLERANCE: f64 = 0.01;

/// Magnitude at or beyond which a sample or threshold is rejected.
pub const MAX_SAFE_VALUE: f64 = 1e6;

fn default_tolerance() -> f64 {
    COMPARISON_TOLERANCE
}

fn default_max_safe_value() -> f64 {
    MAX_SAFE_VALUE
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationSettings {
    #[serde(default = "default_tolerance")]
    pub comparison_tolerance: f64,
    #[serde(default = "default_max_safe_value")]
    pub max_safe_value: f64,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            comparison_tolerance: COMPARISON_TOLERANCE,
            max_safe_value: MAX_SAFE_VALUE,
        }
    }
}

impl EvaluationSettings {
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.comparison_tolerance = tolerance;
        self
    }

    /// Finite and strictly inside the safety bound.
    pub fn is_safe(&self, value: f64) -> bool {
        value.is_finite() && value.abs() < self.max_safe_value
    }

    /// Replaces unusable fields with their defaults.
    pub fn sanitized(self) -> Self {
        let mut settings = self;
        if !settings.comparison_tolerance.is_finite() || settings.comparison_tolerance < 0.0 {
            tracing::warn!(
                "Ignoring comparison tolerance {}, using {}",
                settings.comparison_tolerance,
                COMPARISON_TOLERANCE
            );
            settings.comparison_tolerance = COMPARISON_TOLERANCE;
        }
        if !settings.max_safe_value.is_finite() || settings.max_safe_value <= 0.0 {
            tracing::warn!(
                "Ignoring safety bound {}, using {}",
                settings.max_safe_value,
                MAX_SAFE_VALUE
            );
            settings.max_safe_value = MAX_SAFE_VALUE;
        }
        settings
    }
}

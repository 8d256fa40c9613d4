//! Rubric scoring per CURATION.md §2
//!
//! The rubric is the fixed set of scored dimensions used to gate
//! promotion. Weights and the promotion threshold are PER VERSION and come
//! from configuration — they are parameters, not constants. A version is
//! immutable once in use; changed weights get a new version id.

use serde::{Deserialize, Serialize};

use super::errors::{CurationError, CurationResult};

/// The five fixed rubric dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RubricDimension {
    Safety,
    GoalFit,
    ConstraintFit,
    Novelty,
    InternalConsistency,
}

impl RubricDimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            RubricDimension::Safety => "safety",
            RubricDimension::GoalFit => "goal_fit",
            RubricDimension::ConstraintFit => "constraint_fit",
            RubricDimension::Novelty => "novelty",
            RubricDimension::InternalConsistency => "internal_consistency",
        }
    }

    /// All dimensions, in scoring order.
    pub fn all() -> [RubricDimension; 5] {
        [
            RubricDimension::Safety,
            RubricDimension::GoalFit,
            RubricDimension::ConstraintFit,
            RubricDimension::Novelty,
            RubricDimension::InternalConsistency,
        ]
    }
}

/// Reviewer scores, one per dimension, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RubricScores {
    pub safety: f64,
    pub goal_fit: f64,
    pub constraint_fit: f64,
    pub novelty: f64,
    pub internal_consistency: f64,
}

impl RubricScores {
    /// Score for one dimension.
    pub fn get(&self, dimension: RubricDimension) -> f64 {
        match dimension {
            RubricDimension::Safety => self.safety,
            RubricDimension::GoalFit => self.goal_fit,
            RubricDimension::ConstraintFit => self.constraint_fit,
            RubricDimension::Novelty => self.novelty,
            RubricDimension::InternalConsistency => self.internal_consistency,
        }
    }

    /// Reject any score outside [0, 1].
    pub fn validate(&self) -> CurationResult<()> {
        for dimension in RubricDimension::all() {
            let value = self.get(dimension);
            if !(0.0..=1.0).contains(&value) || !value.is_finite() {
                return Err(CurationError::InvalidScore {
                    dimension: dimension.as_str(),
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Per-dimension weights. Normalized at scoring time, so configured
/// weights need not sum to exactly 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RubricWeights {
    pub safety: f64,
    pub goal_fit: f64,
    pub constraint_fit: f64,
    pub novelty: f64,
    pub internal_consistency: f64,
}

impl RubricWeights {
    fn get(&self, dimension: RubricDimension) -> f64 {
        match dimension {
            RubricDimension::Safety => self.safety,
            RubricDimension::GoalFit => self.goal_fit,
            RubricDimension::ConstraintFit => self.constraint_fit,
            RubricDimension::Novelty => self.novelty,
            RubricDimension::InternalConsistency => self.internal_consistency,
        }
    }

    fn total(&self) -> f64 {
        RubricDimension::all().iter().map(|d| self.get(*d)).sum()
    }
}

/// One immutable rubric version: weights plus promotion threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricVersion {
    pub version: String,
    pub weights: RubricWeights,
    /// Weighted total at or above this promotes (G4)
    pub threshold: f64,
}

impl RubricVersion {
    /// The default shipped rubric.
    pub fn v1() -> Self {
        Self {
            version: "v1".to_string(),
            weights: RubricWeights {
                safety: 0.30,
                goal_fit: 0.25,
                constraint_fit: 0.20,
                novelty: 0.10,
                internal_consistency: 0.15,
            },
            threshold: 0.70,
        }
    }

    /// Weighted total of a score set under this version.
    pub fn weighted_total(&self, scores: &RubricScores) -> f64 {
        let weight_sum = self.weights.total();
        if weight_sum <= 0.0 {
            return 0.0;
        }
        RubricDimension::all()
            .iter()
            .map(|d| self.weights.get(*d) * scores.get(*d))
            .sum::<f64>()
            / weight_sum
    }

    /// Whether a score set clears this version's threshold.
    pub fn passes(&self, scores: &RubricScores) -> bool {
        self.weighted_total(scores) >= self.threshold
    }
}

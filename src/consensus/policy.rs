//! Consensus central-tendency policy
//!
//! Per CONSENSUS.md §2 the exact statistical method is a CONFIGURABLE
//! policy, not a hard-coded choice. All policies are deterministic: samples
//! are sorted before any arithmetic, so input order never changes the
//! result.

use serde::{Deserialize, Serialize};

/// Confidence assumed for a respondent who did not state one.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// How the consensus quality is computed from per-expert samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ConsensusPolicy {
    /// Mean after trimming `trim_fraction` of samples from each end.
    /// With few samples the trim count floors to 0 (plain mean).
    TrimmedMean { trim_fraction: f64 },
    /// Middle sample (mean of the middle two for even counts).
    Median,
    /// Mean weighted by each respondent's stated confidence.
    ConfidenceWeighted,
}

impl Default for ConsensusPolicy {
    fn default() -> Self {
        ConsensusPolicy::TrimmedMean { trim_fraction: 0.2 }
    }
}

impl ConsensusPolicy {
    /// Central tendency of `(value, confidence)` samples. Empty input
    /// yields 0.0; callers gate on the expert-count threshold first.
    pub fn central(&self, samples: &[(f64, f64)]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let mut sorted: Vec<(f64, f64)> = samples.to_vec();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        match self {
            ConsensusPolicy::TrimmedMean { trim_fraction } => {
                let k = ((sorted.len() as f64) * trim_fraction).floor() as usize;
                // Never trim away everything
                let k = k.min((sorted.len() - 1) / 2);
                let kept = &sorted[k..sorted.len() - k];
                kept.iter().map(|(v, _)| v).sum::<f64>() / kept.len() as f64
            }
            ConsensusPolicy::Median => {
                let n = sorted.len();
                if n % 2 == 1 {
                    sorted[n / 2].0
                } else {
                    (sorted[n / 2 - 1].0 + sorted[n / 2].0) / 2.0
                }
            }
            ConsensusPolicy::ConfidenceWeighted => {
                let weight_sum: f64 = sorted.iter().map(|(_, c)| c).sum();
                if weight_sum <= 0.0 {
                    return sorted.iter().map(|(v, _)| v).sum::<f64>() / sorted.len() as f64;
                }
                sorted.iter().map(|(v, c)| v * c).sum::<f64>() / weight_sum
            }
        }
    }
}

/// Population standard deviation of the values.
pub fn dispersion(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_conf(values: &[f64]) -> Vec<(f64, f64)> {
        values.iter().map(|v| (*v, DEFAULT_CONFIDENCE)).collect()
    }

    #[test]
    fn test_trimmed_mean_drops_outlier() {
        let policy = ConsensusPolicy::TrimmedMean { trim_fraction: 0.2 };
        // 5 samples, trim 1 each side: outlier 0.0 removed
        let samples = with_conf(&[0.0, 0.7, 0.72, 0.74, 1.0]);
        let central = policy.central(&samples);
        assert!((central - 0.72).abs() < 0.02);
    }

    #[test]
    fn test_trimmed_mean_small_n_is_plain_mean() {
        let policy = ConsensusPolicy::TrimmedMean { trim_fraction: 0.2 };
        let samples = with_conf(&[0.6, 0.8]);
        assert!((policy.central(&samples) - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_median_even_and_odd() {
        let policy = ConsensusPolicy::Median;
        assert_eq!(policy.central(&with_conf(&[0.2, 0.6, 0.9])), 0.6);
        assert!((policy.central(&with_conf(&[0.2, 0.4, 0.6, 0.9])) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_weighted_leans_toward_confident() {
        let policy = ConsensusPolicy::ConfidenceWeighted;
        let samples = vec![(0.9, 0.9), (0.3, 0.1)];
        let central = policy.central(&samples);
        assert!(central > 0.7, "high-confidence sample should dominate: {}", central);
    }

    #[test]
    fn test_order_independence() {
        for policy in [
            ConsensusPolicy::TrimmedMean { trim_fraction: 0.2 },
            ConsensusPolicy::Median,
            ConsensusPolicy::ConfidenceWeighted,
        ] {
            let a = policy.central(&[(0.2, 0.5), (0.8, 0.9), (0.5, 0.3)]);
            let b = policy.central(&[(0.8, 0.9), (0.5, 0.3), (0.2, 0.5)]);
            assert_eq!(a, b, "policy {:?} is order-dependent", policy);
        }
    }

    #[test]
    fn test_dispersion() {
        assert_eq!(dispersion(&[0.5]), 0.0);
        assert_eq!(dispersion(&[0.5, 0.5, 0.5]), 0.0);
        assert!(dispersion(&[0.0, 1.0]) > 0.4);
    }
}

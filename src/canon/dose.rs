//! Dose feature derivation per CANON.md §4
//!
//! Dose features are a flat numeric summary of a validated plan,
//! materialized once at capture time so downstream consumers (curation,
//! consensus, evaluation) never re-parse plan JSON.

use serde::{Deserialize, Serialize};

use super::plan::{Activity, WorkoutPlan};

/// High-intensity threshold: climbing attempts at or above this fraction of
/// limit grade count as `hi_attempts`.
pub const HI_INTENSITY_THRESHOLD: f64 = 0.8;

/// Flat dose-feature vector derived from a plan.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DoseFeatures {
    /// Climbing attempts at intensity >= HI_INTENSITY_THRESHOLD
    pub hi_attempts: u32,
    /// All climbing attempts
    pub total_attempts: u32,
    /// Total strength time under tension, seconds
    pub time_under_tension_s: u32,
    /// Endurance work, minutes
    pub endurance_min: u32,
    /// Mobility work, minutes
    pub mobility_min: u32,
    /// Prescribed rest, minutes
    pub rest_min: u32,
    /// Peak prescribed intensity across all dosed items
    pub peak_intensity: f64,
    /// Scalar fatigue cost of the whole plan
    pub fatigue_cost: f64,
}

impl DoseFeatures {
    /// Derive dose features from a validated plan.
    ///
    /// Deterministic: iterates items in plan order and accumulates with
    /// fixed weights, so the same plan always yields the same vector.
    pub fn derive(plan: &WorkoutPlan) -> Self {
        let mut features = DoseFeatures::default();

        for item in plan.items() {
            match item {
                Activity::Climbing(dose) => {
                    features.total_attempts += dose.attempts;
                    if dose.intensity >= HI_INTENSITY_THRESHOLD {
                        features.hi_attempts += dose.attempts;
                    }
                    features.peak_intensity = features.peak_intensity.max(dose.intensity);
                    // Attempts scale superlinearly with intensity
                    features.fatigue_cost +=
                        dose.attempts as f64 * dose.intensity * dose.intensity * 1.5;
                }
                Activity::Strength(dose) => {
                    features.time_under_tension_s += dose.time_under_tension_s;
                    features.peak_intensity = features.peak_intensity.max(dose.intensity);
                    features.fatigue_cost +=
                        (dose.sets * dose.reps) as f64 * dose.intensity * 0.8;
                }
                Activity::Endurance(dose) => {
                    features.endurance_min += dose.duration_min;
                    features.peak_intensity = features.peak_intensity.max(dose.intensity);
                    features.fatigue_cost += dose.duration_min as f64 * dose.intensity * 0.3;
                }
                Activity::Mobility(dose) => {
                    features.mobility_min += dose.duration_min;
                    // Mobility recovers rather than costs
                    features.fatigue_cost -= dose.duration_min as f64 * 0.05;
                }
                Activity::Rest(dose) => {
                    features.rest_min += dose.duration_min;
                    features.fatigue_cost -= dose.duration_min as f64 * 0.1;
                }
            }
        }

        features.fatigue_cost = features.fatigue_cost.max(0.0);
        features
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canon::plan::{ClimbStyle, ClimbingDose, PlanBlock, PlanPhase, RestDose};

    fn plan_with(items: Vec<Activity>) -> WorkoutPlan {
        WorkoutPlan {
            name: "test".into(),
            phases: vec![PlanPhase {
                name: "main".into(),
                blocks: vec![PlanBlock {
                    name: "work".into(),
                    items,
                }],
            }],
        }
    }

    #[test]
    fn test_hi_attempts_counted_at_threshold() {
        let plan = plan_with(vec![
            Activity::Climbing(ClimbingDose {
                style: ClimbStyle::Boulder,
                attempts: 12,
                intensity: 0.9,
                rest_between_s: 180,
            }),
            Activity::Climbing(ClimbingDose {
                style: ClimbStyle::Boulder,
                attempts: 6,
                intensity: 0.5,
                rest_between_s: 60,
            }),
        ]);

        let features = DoseFeatures::derive(&plan);
        assert_eq!(features.hi_attempts, 12);
        assert_eq!(features.total_attempts, 18);
        assert_eq!(features.peak_intensity, 0.9);
    }

    #[test]
    fn test_fatigue_cost_never_negative() {
        let plan = plan_with(vec![Activity::Rest(RestDose { duration_min: 600 })]);
        let features = DoseFeatures::derive(&plan);
        assert_eq!(features.fatigue_cost, 0.0);
        assert_eq!(features.rest_min, 600);
    }

    #[test]
    fn test_derive_is_deterministic() {
        let plan = plan_with(vec![Activity::Climbing(ClimbingDose {
            style: ClimbStyle::Sport,
            attempts: 8,
            intensity: 0.85,
            rest_between_s: 240,
        })]);

        let a = DoseFeatures::derive(&plan);
        let b = DoseFeatures::derive(&plan);
        assert_eq!(a, b);
    }
}

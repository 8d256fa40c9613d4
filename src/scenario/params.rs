//! Transition parameter sets
//!
//! Per SCENARIO.md §3: the transition function is parameterized by a named,
//! immutable parameter set. An episode records the id of the set it was
//! started with; the pair `(rng_seed, param_set_id)` fully determines the
//! state sequence (SM2). Parameter sets are therefore never edited in
//! place — a changed set gets a new id.

use serde::{Deserialize, Serialize};

use super::state::EventClass;

/// Specification of one schedulable event class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSpec {
    pub class: EventClass,
    /// Per-step trigger probability while eligible
    pub probability: f64,
    /// Steps the event occupies the state once triggered
    pub duration_steps: u32,
    /// Steps after the event ends before the class is eligible again
    pub cooldown_steps: u32,
    /// Maximum triggers of this class within one episode.
    /// Per SCENARIO.md §SM4: violating the budget must NEVER trigger.
    pub budget: u32,
    /// Severity in [0, 1], scales the event's latent-state impact
    pub severity: f64,
}

/// A named, immutable transition parameter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionParamSet {
    /// Stable id recorded on every episode that uses this set
    pub param_set_id: String,

    /// Fraction of accumulated fatigue recovered per step
    pub fatigue_recovery: f64,
    /// Fitness drift per step while training load persists
    pub fitness_gain: f64,
    /// Motivation reversion rate toward persona baseline
    pub motivation_reversion: f64,
    /// Per-step growth of latent-state uncertainty
    pub uncertainty_growth: f64,
    /// Scale of per-step latent noise draws
    pub noise_scale: f64,

    /// Training phase cycle lengths, in steps: base, build, peak, deload
    pub phase_lengths: [u32; 4],

    /// Event classes this set can schedule, in fixed declaration order.
    /// Order is semantic: draws are consumed in this order every step.
    pub events: Vec<EventSpec>,
}

impl TransitionParamSet {
    /// The default builtin parameter set.
    pub fn default_set() -> Self {
        Self {
            param_set_id: "default-v1".to_string(),
            fatigue_recovery: 0.25,
            fitness_gain: 0.01,
            motivation_reversion: 0.15,
            uncertainty_growth: 0.02,
            noise_scale: 0.05,
            phase_lengths: [4, 4, 2, 1],
            events: vec![
                EventSpec {
                    class: EventClass::FingerTweak,
                    probability: 0.08,
                    duration_steps: 3,
                    cooldown_steps: 4,
                    budget: 2,
                    severity: 0.7,
                },
                EventSpec {
                    class: EventClass::Illness,
                    probability: 0.04,
                    duration_steps: 2,
                    cooldown_steps: 6,
                    budget: 1,
                    severity: 0.8,
                },
                EventSpec {
                    class: EventClass::PoorSleep,
                    probability: 0.15,
                    duration_steps: 1,
                    cooldown_steps: 2,
                    budget: 4,
                    severity: 0.4,
                },
                EventSpec {
                    class: EventClass::ScheduleCrunch,
                    probability: 0.10,
                    duration_steps: 2,
                    cooldown_steps: 3,
                    budget: 2,
                    severity: 0.3,
                },
            ],
        }
    }

    /// A quiet set with no schedulable events, for tests and calibration.
    pub fn quiet_set() -> Self {
        Self {
            param_set_id: "quiet-v1".to_string(),
            events: Vec::new(),
            ..Self::default_set()
        }
    }

    /// Look up a builtin parameter set by id.
    pub fn builtin(id: &str) -> Option<Self> {
        match id {
            "default-v1" => Some(Self::default_set()),
            "quiet-v1" => Some(Self::quiet_set()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        assert!(TransitionParamSet::builtin("default-v1").is_some());
        assert!(TransitionParamSet::builtin("quiet-v1").is_some());
        assert!(TransitionParamSet::builtin("nope").is_none());
    }

    #[test]
    fn test_default_set_has_events() {
        let set = TransitionParamSet::default_set();
        assert_eq!(set.param_set_id, "default-v1");
        assert!(!set.events.is_empty());
        for event in &set.events {
            assert!(event.budget > 0);
            assert!((0.0..=1.0).contains(&event.probability));
        }
    }

    #[test]
    fn test_quiet_set_has_no_events() {
        assert!(TransitionParamSet::quiet_set().events.is_empty());
    }
}

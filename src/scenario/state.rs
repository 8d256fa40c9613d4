//! ScenarioState — one immutable snapshot of simulated world state
//!
//! Per SCENARIO.md §SM1:
//! - States for one episode form a strictly increasing, singly-linked,
//!   append-only chain
//! - No state is ever mutated after creation
//! - The successor of a state is a pure function of
//!   `(prev_state, param_set)` — the RNG stream position is part of the
//!   state itself
//!
//! This file is data containers only. The transition function lives in
//! `transition.rs`; chain enforcement lives in `engine.rs`.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Event classes the simulator can schedule.
///
/// Ord is derived so ledgers serialize with deterministic key order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EventClass {
    /// Acute finger pain; sets the pain constraint while active
    FingerTweak,
    /// Systemic illness
    Illness,
    /// One or more nights of disrupted sleep
    PoorSleep,
    /// External time pressure shrinking available training time
    ScheduleCrunch,
}

impl EventClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventClass::FingerTweak => "finger_tweak",
            EventClass::Illness => "illness",
            EventClass::PoorSleep => "poor_sleep",
            EventClass::ScheduleCrunch => "schedule_crunch",
        }
    }
}

/// Immutable persona baseline, snapshotted into every state of an episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaBaseline {
    /// Ability on a unit scale (fraction of the simulated population ceiling)
    pub ability: f64,
    pub training_age_years: f64,
    /// Susceptibility to overuse events, [0, 1]
    pub injury_proneness: f64,
    /// Motivation set point, [0, 1]
    pub baseline_motivation: f64,
}

impl Default for PersonaBaseline {
    fn default() -> Self {
        Self {
            ability: 0.6,
            training_age_years: 4.0,
            injury_proneness: 0.3,
            baseline_motivation: 0.7,
        }
    }
}

/// Latent physiological/psychological state, all on unit scales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatentState {
    pub fatigue: f64,
    pub fitness: f64,
    pub motivation: f64,
    pub injury_risk: f64,
}

/// Uncertainty (standard deviation) attached to the latent estimates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatentUncertainty {
    pub fatigue_sd: f64,
    pub fitness_sd: f64,
    pub motivation_sd: f64,
}

/// Session constraints visible to experts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    /// Minutes available for the next session
    pub available_min: u32,
    /// Whether the persona currently reports pain
    pub has_pain: bool,
    /// Whether a full facility (board, weights) is available this step
    pub full_facility: bool,
}

/// Training phase within the episode's periodization cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingPhase {
    Base,
    Build,
    Peak,
    Deload,
}

impl TrainingPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrainingPhase::Base => "base",
            TrainingPhase::Build => "build",
            TrainingPhase::Peak => "peak",
            TrainingPhase::Deload => "deload",
        }
    }
}

/// An event currently occupying the state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveEvent {
    pub class: EventClass,
    /// Steps remaining including the current one
    pub remaining_steps: u32,
    pub severity: f64,
}

/// Per-episode event bookkeeping: cooldowns and spent budgets.
///
/// BTreeMap keys keep serialization deterministic.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EventLedger {
    /// Steps remaining before a class is eligible again
    pub cooldowns: BTreeMap<EventClass, u32>,
    /// Triggers consumed per class this episode
    pub budget_spent: BTreeMap<EventClass, u32>,
}

impl EventLedger {
    pub fn cooldown(&self, class: EventClass) -> u32 {
        self.cooldowns.get(&class).copied().unwrap_or(0)
    }

    pub fn spent(&self, class: EventClass) -> u32 {
        self.budget_spent.get(&class).copied().unwrap_or(0)
    }
}

/// One immutable snapshot of simulated world state at a step index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioState {
    pub scenario_state_id: Uuid,
    pub episode_id: Uuid,
    pub t_index: u32,
    /// Link to the predecessor; None only at t=0
    pub prev_scenario_state_id: Option<Uuid>,

    pub persona: PersonaBaseline,
    pub latent: LatentState,
    pub uncertainty: LatentUncertainty,
    /// Composite readiness in [0, 1]
    pub readiness: f64,
    pub constraints: Constraints,
    pub phase: TrainingPhase,

    pub active_event: Option<ActiveEvent>,
    pub events: EventLedger,

    pub rng_seed: u64,
    /// RNG stream position AFTER producing this state
    pub rng_state: u64,
    pub engine_version: String,
}

impl ScenarioState {
    /// Derive the deterministic id for a state.
    ///
    /// Ids are a pure function of `(episode_id, t_index, rng_state)` so that
    /// replaying a transition reproduces the successor bit-for-bit,
    /// including its id (SM2). Wall-clock time never enters a state.
    pub fn derive_id(episode_id: Uuid, t_index: u32, rng_state: u64) -> Uuid {
        let mut hasher = Sha256::new();
        hasher.update(episode_id.as_bytes());
        hasher.update(t_index.to_be_bytes());
        hasher.update(rng_state.to_be_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..16]);
        Uuid::from_bytes(bytes)
    }
}

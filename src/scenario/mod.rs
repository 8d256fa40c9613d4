//! Scenario State Machine
//!
//! Per SCENARIO.md:
//! - SM1: states for one episode form a strictly increasing, singly-linked,
//!   append-only chain; no state is mutated after creation
//! - SM2: for a fixed `(rng_seed, param_set_id)` the full state sequence is
//!   reproducible bit-for-bit, so expert judgments stay attached to a
//!   re-derivable world state
//! - SM3: advancement is single-writer per episode; lost races fail with an
//!   explicit `ConcurrentAdvance`
//! - SM4: event cooldowns and budgets gate recurrence; a gated class never
//!   triggers
//! - SM5: reads are pure lookups, never recomputation
//! - SM6: operations respect caller deadlines and fail closed

mod engine;
mod episode;
mod errors;
mod params;
mod rng;
mod state;
mod transition;

pub use engine::{ScenarioEngine, DEFAULT_MAX_STEPS};
pub use episode::{Episode, EpisodeStatus};
pub use errors::{ScenarioError, ScenarioErrorKind, ScenarioResult};
pub use params::{EventSpec, TransitionParamSet};
pub use rng::DeterministicRng;
pub use state::{
    ActiveEvent, Constraints, EventClass, EventLedger, LatentState, LatentUncertainty,
    PersonaBaseline, ScenarioState, TrainingPhase,
};
pub use transition::{advance_state, initial_state};

//! Scenario engine — episode lifecycle and append-only chain enforcement
//!
//! Per SCENARIO.md:
//! - SM1: states for one episode form a strictly increasing, singly-linked,
//!   append-only chain; nothing is mutated after creation
//! - SM3: advancement is single-writer per episode. All writes go through
//!   one lock, and an optimistic expected-head check turns a lost race into
//!   an explicit `ConcurrentAdvance` rejection instead of a duplicate step
//! - SM5: `get_state` is a pure lookup; history is never recomputed
//! - SM6: operations check the caller deadline up front and fail closed

use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use super::episode::{Episode, EpisodeStatus};
use super::errors::{ScenarioError, ScenarioResult};
use super::params::TransitionParamSet;
use super::state::{PersonaBaseline, ScenarioState};
use super::transition::{advance_state, initial_state};
use crate::core::Deadline;
use crate::ENGINE_VERSION;

/// Default step limit per episode.
pub const DEFAULT_MAX_STEPS: u32 = 24;

/// The scenario engine. Owns all episodes and their state chains.
pub struct ScenarioEngine {
    max_steps: u32,
    inner: Mutex<EngineInner>,
}

struct EngineInner {
    episodes: HashMap<Uuid, Episode>,
    chains: HashMap<Uuid, Vec<ScenarioState>>,
    param_sets: HashMap<String, TransitionParamSet>,
}

impl ScenarioEngine {
    /// Create an engine with the default step limit and builtin param sets.
    pub fn new() -> Self {
        Self::with_max_steps(DEFAULT_MAX_STEPS)
    }

    /// Create an engine with a custom step limit.
    pub fn with_max_steps(max_steps: u32) -> Self {
        let mut param_sets = HashMap::new();
        for set in [
            TransitionParamSet::default_set(),
            TransitionParamSet::quiet_set(),
        ] {
            param_sets.insert(set.param_set_id.clone(), set);
        }
        Self {
            max_steps,
            inner: Mutex::new(EngineInner {
                episodes: HashMap::new(),
                chains: HashMap::new(),
                param_sets,
            }),
        }
    }

    /// Register an additional parameter set. Sets are immutable: an id that
    /// already exists is not overwritten.
    pub fn register_param_set(&self, set: TransitionParamSet) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .param_sets
            .entry(set.param_set_id.clone())
            .or_insert(set);
    }

    /// Start a new episode and derive its initial (t=0) state.
    ///
    /// The seed is caller-pinned or drawn fresh; either way it is recorded
    /// on the episode so the run is replayable.
    pub fn start_episode(
        &self,
        seed: Option<u64>,
        param_set_id: Option<&str>,
        persona: Option<PersonaBaseline>,
        deadline: &Deadline,
    ) -> ScenarioResult<(Episode, ScenarioState)> {
        if deadline.lapsed() {
            return Err(ScenarioError::deadline_lapsed("start_episode"));
        }

        let mut inner = self.inner.lock().unwrap();

        let param_set_id = param_set_id.unwrap_or("default-v1");
        let params = inner
            .param_sets
            .get(param_set_id)
            .cloned()
            .ok_or_else(|| ScenarioError::unknown_param_set(param_set_id))?;

        let seed = seed.unwrap_or_else(rand::random::<u64>);
        let mut episode = Episode::new(seed, param_set_id, ENGINE_VERSION);
        let state = initial_state(
            episode.episode_id,
            seed,
            ENGINE_VERSION,
            persona.unwrap_or_default(),
            &params,
        );
        episode.status = episode.status.begin()?;

        inner
            .chains
            .insert(episode.episode_id, vec![state.clone()]);
        inner.episodes.insert(episode.episode_id, episode.clone());

        Ok((episode, state))
    }

    /// Advance an episode by one step, appending the successor state.
    ///
    /// `expected_head`: the head `t_index` the caller last observed. If the
    /// head has moved the call fails with `ConcurrentAdvance` and nothing is
    /// applied; the caller refetches the head and retries (SM3). `None`
    /// skips the optimistic check (serialization still holds via the lock).
    pub fn advance_episode(
        &self,
        episode_id: Uuid,
        expected_head: Option<u32>,
        deadline: &Deadline,
    ) -> ScenarioResult<ScenarioState> {
        if deadline.lapsed() {
            return Err(ScenarioError::deadline_lapsed("advance_episode"));
        }

        let mut inner = self.inner.lock().unwrap();

        let episode = inner
            .episodes
            .get(&episode_id)
            .ok_or_else(|| ScenarioError::episode_not_found(episode_id))?;

        if episode.status == EpisodeStatus::Terminal {
            return Err(ScenarioError::episode_terminal(episode_id));
        }

        let params = inner
            .param_sets
            .get(&episode.param_set_id)
            .cloned()
            .ok_or_else(|| ScenarioError::unknown_param_set(&episode.param_set_id))?;

        let chain = inner
            .chains
            .get(&episode_id)
            .ok_or_else(|| ScenarioError::episode_not_found(episode_id))?;
        let head = chain
            .last()
            .ok_or_else(|| ScenarioError::state_not_found(episode_id, 0))?;

        if let Some(expected) = expected_head {
            if expected != head.t_index {
                return Err(ScenarioError::concurrent_advance(expected, head.t_index));
            }
        }

        let next = advance_state(head, &params);
        let next_t = next.t_index;

        inner
            .chains
            .get_mut(&episode_id)
            .expect("chain exists")
            .push(next.clone());

        let episode = inner
            .episodes
            .get_mut(&episode_id)
            .expect("episode exists");
        episode.head_t = next_t;
        if next_t >= self.max_steps {
            episode.status = episode.status.finish()?;
        }

        Ok(next)
    }

    /// Pure lookup of the state at a step index (SM5). Never recomputes.
    pub fn get_state(&self, episode_id: Uuid, t_index: u32) -> ScenarioResult<ScenarioState> {
        let inner = self.inner.lock().unwrap();
        let chain = inner
            .chains
            .get(&episode_id)
            .ok_or_else(|| ScenarioError::episode_not_found(episode_id))?;
        chain
            .get(t_index as usize)
            .cloned()
            .ok_or_else(|| ScenarioError::state_not_found(episode_id, t_index))
    }

    /// Current head state of an episode.
    pub fn head_state(&self, episode_id: Uuid) -> ScenarioResult<ScenarioState> {
        let inner = self.inner.lock().unwrap();
        let chain = inner
            .chains
            .get(&episode_id)
            .ok_or_else(|| ScenarioError::episode_not_found(episode_id))?;
        chain
            .last()
            .cloned()
            .ok_or_else(|| ScenarioError::state_not_found(episode_id, 0))
    }

    /// Episode record lookup.
    pub fn get_episode(&self, episode_id: Uuid) -> ScenarioResult<Episode> {
        let inner = self.inner.lock().unwrap();
        inner
            .episodes
            .get(&episode_id)
            .cloned()
            .ok_or_else(|| ScenarioError::episode_not_found(episode_id))
    }
}

impl Default for ScenarioEngine {
    fn default() -> Self {
        Self::new()
    }
}

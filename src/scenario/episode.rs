//! Episode record and lifecycle state machine
//!
//! Per SCENARIO.md §2:
//! - Lifecycle: Created → Running → Terminal
//! - Transitions are explicit and event-driven, never inferred
//! - An episode is immutable once created except for its head index and
//!   lifecycle status

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{ScenarioError, ScenarioResult};

/// Episode lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeStatus {
    /// Created but initial state not yet derived
    Created,
    /// Initial state exists; advancement allowed
    Running,
    /// Step limit reached; chain is frozen
    Terminal,
}

impl EpisodeStatus {
    /// Get the status name for observability.
    pub fn as_str(&self) -> &'static str {
        match self {
            EpisodeStatus::Created => "created",
            EpisodeStatus::Running => "running",
            EpisodeStatus::Terminal => "terminal",
        }
    }

    /// Created → Running. Entry: initial state derived.
    pub fn begin(self) -> ScenarioResult<Self> {
        match self {
            EpisodeStatus::Created => Ok(EpisodeStatus::Running),
            _ => Err(ScenarioError::forbidden_transition(self.as_str(), "running")),
        }
    }

    /// Running → Terminal. Entry: step limit reached.
    pub fn finish(self) -> ScenarioResult<Self> {
        match self {
            EpisodeStatus::Running => Ok(EpisodeStatus::Terminal),
            _ => Err(ScenarioError::forbidden_transition(self.as_str(), "terminal")),
        }
    }
}

/// One deterministic run of the scenario simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub episode_id: Uuid,
    /// Current head step index
    pub head_t: u32,
    pub param_set_id: String,
    pub rng_seed: u64,
    pub engine_version: String,
    pub status: EpisodeStatus,
    pub created_at: DateTime<Utc>,
}

impl Episode {
    /// Create a new episode record in Created status at head 0.
    pub fn new(rng_seed: u64, param_set_id: impl Into<String>, engine_version: &str) -> Self {
        Self {
            episode_id: Uuid::new_v4(),
            head_t: 0,
            param_set_id: param_set_id.into(),
            rng_seed,
            engine_version: engine_version.to_string(),
            status: EpisodeStatus::Created,
            created_at: Utc::now(),
        }
    }
}

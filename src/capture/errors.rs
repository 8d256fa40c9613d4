//! # Capture Errors
//!
//! Error types for the expert capture store.
//!
//! Per CONCURRENCY.md §2: a submission referencing a scenario state that is
//! no longer the head for its `(episode, t_index)` is rejected with
//! `StaleState`; the caller refetches the state and resubmits.

use thiserror::Error;
use uuid::Uuid;

use crate::canon::ValidationError;
use crate::scenario::ScenarioError;

/// Result type for capture operations
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Capture errors
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    /// Submission references a superseded scenario state
    #[error(
        "stale state: {scenario_state_id} is not the current state for \
         episode {episode_id} at t={t_index}"
    )]
    StaleState {
        episode_id: Uuid,
        t_index: u32,
        scenario_state_id: Uuid,
    },

    /// Plan failed schema validation; nothing was hashed or stored
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Underlying scenario lookup failed (unknown episode, missing state)
    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    /// Recommendation id is unknown
    #[error("recommendation not found: {0}")]
    NotFound(Uuid),

    /// The raw case was already promoted; its content is frozen
    #[error("recommendation {0} is curated and immutable")]
    CuratedImmutable(Uuid),

    /// Caller deadline lapsed before the operation ran; nothing was applied
    #[error("deadline lapsed before '{0}' ran; nothing applied")]
    DeadlineLapsed(&'static str),
}

impl CaptureError {
    /// Returns the string code as defined in ERRORS.md
    pub fn code(&self) -> &'static str {
        match self {
            CaptureError::StaleState { .. } => "BETA_STALE_STATE",
            CaptureError::Validation(_) => "BETA_PLAN_INVALID",
            CaptureError::Scenario(_) => "BETA_SCENARIO_LOOKUP",
            CaptureError::NotFound(_) => "BETA_REC_NOT_FOUND",
            CaptureError::CuratedImmutable(_) => "BETA_REC_CURATED_IMMUTABLE",
            CaptureError::DeadlineLapsed(_) => "BETA_DEADLINE_LAPSED",
        }
    }
}

//! Scenario simulator error types
//!
//! Per SCENARIO.md §SM3: concurrent advancement of one episode must be
//! serialized; a losing advance fails explicitly with
//! `ConcurrentAdvance` and is retried by the caller against the new head.
//! The chain is never silently advanced twice.

use std::fmt;

/// Scenario error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioErrorKind {
    /// Episode id is unknown
    EpisodeNotFound,

    /// No state exists at the requested step index
    StateNotFound,

    /// Lost an optimistic advance race; caller retries against the new head
    ConcurrentAdvance,

    /// Episode has reached its terminal state and cannot advance
    EpisodeTerminal,

    /// Forbidden episode lifecycle transition attempted
    ForbiddenTransition,

    /// Unknown transition parameter set
    UnknownParamSet,

    /// Caller deadline lapsed before the operation ran; nothing was applied
    DeadlineLapsed,
}

impl ScenarioErrorKind {
    /// Returns the string code as defined in ERRORS.md
    pub fn code(&self) -> &'static str {
        match self {
            ScenarioErrorKind::EpisodeNotFound => "BETA_EPISODE_NOT_FOUND",
            ScenarioErrorKind::StateNotFound => "BETA_STATE_NOT_FOUND",
            ScenarioErrorKind::ConcurrentAdvance => "BETA_CONCURRENT_ADVANCE",
            ScenarioErrorKind::EpisodeTerminal => "BETA_EPISODE_TERMINAL",
            ScenarioErrorKind::ForbiddenTransition => "BETA_FORBIDDEN_TRANSITION",
            ScenarioErrorKind::UnknownParamSet => "BETA_UNKNOWN_PARAM_SET",
            ScenarioErrorKind::DeadlineLapsed => "BETA_DEADLINE_LAPSED",
        }
    }

    /// Returns the invariant protected by this rejection
    pub fn invariant(&self) -> &'static str {
        match self {
            ScenarioErrorKind::ConcurrentAdvance => "SM3",
            ScenarioErrorKind::EpisodeTerminal => "SM1",
            ScenarioErrorKind::ForbiddenTransition => "SM1",
            ScenarioErrorKind::StateNotFound => "SM5",
            ScenarioErrorKind::DeadlineLapsed => "SM6",
            _ => "SM1",
        }
    }
}

/// Scenario error type
#[derive(Debug, Clone)]
pub struct ScenarioError {
    /// Error kind
    pub kind: ScenarioErrorKind,
    /// Error message
    pub message: String,
}

impl ScenarioError {
    /// Create a new scenario error.
    pub fn new(kind: ScenarioErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create an episode-not-found error.
    pub fn episode_not_found(episode_id: impl fmt::Display) -> Self {
        Self::new(
            ScenarioErrorKind::EpisodeNotFound,
            format!("episode '{}' not found", episode_id),
        )
    }

    /// Create a state-not-found error.
    pub fn state_not_found(episode_id: impl fmt::Display, t_index: u32) -> Self {
        Self::new(
            ScenarioErrorKind::StateNotFound,
            format!("episode '{}' has no state at t={}", episode_id, t_index),
        )
    }

    /// Create a concurrent-advance error. The caller lost the race and must
    /// refetch the head before retrying.
    pub fn concurrent_advance(expected_t: u32, actual_t: u32) -> Self {
        Self::new(
            ScenarioErrorKind::ConcurrentAdvance,
            format!(
                "advance lost race: expected head t={}, actual head t={}",
                expected_t, actual_t
            ),
        )
    }

    /// Create an episode-terminal error.
    pub fn episode_terminal(episode_id: impl fmt::Display) -> Self {
        Self::new(
            ScenarioErrorKind::EpisodeTerminal,
            format!("episode '{}' is terminal and cannot advance", episode_id),
        )
    }

    /// Create a forbidden lifecycle transition error.
    pub fn forbidden_transition(from: &str, to: &str) -> Self {
        Self::new(
            ScenarioErrorKind::ForbiddenTransition,
            format!("forbidden transition: {} -> {}", from, to),
        )
    }

    /// Create an unknown-param-set error.
    pub fn unknown_param_set(id: &str) -> Self {
        Self::new(
            ScenarioErrorKind::UnknownParamSet,
            format!("unknown transition parameter set '{}'", id),
        )
    }

    /// Create a deadline-lapsed error. Nothing was applied.
    pub fn deadline_lapsed(op: &str) -> Self {
        Self::new(
            ScenarioErrorKind::DeadlineLapsed,
            format!("deadline lapsed before '{}' ran; nothing applied", op),
        )
    }
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} [violates {}]",
            self.kind.code(),
            self.message,
            self.kind.invariant()
        )
    }
}

impl std::error::Error for ScenarioError {}

/// Result type for scenario operations
pub type ScenarioResult<T> = Result<T, ScenarioError>;

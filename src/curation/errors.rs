//! # Curation Errors
//!
//! Per CURATION.md: a rubric score below threshold is NOT an error — it is
//! a normal outcome (`is_curated = false`). Errors here are strictly
//! lookup, configuration, and input-shape failures.

use thiserror::Error;
use uuid::Uuid;

use crate::capture::CaptureError;

/// Result type for curation operations
pub type CurationResult<T> = Result<T, CurationError>;

/// Curation errors
#[derive(Debug, Clone, Error)]
pub enum CurationError {
    /// Raw recommendation id is unknown
    #[error("recommendation not found: {0}")]
    RecommendationNotFound(Uuid),

    /// Rubric version is not configured
    #[error("unknown rubric version: {0}")]
    UnknownRubricVersion(String),

    /// A rubric score is outside [0, 1]
    #[error("rubric score for '{dimension}' out of range: {value}")]
    InvalidScore { dimension: &'static str, value: f64 },

    /// Underlying capture store failure
    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// Caller deadline lapsed before the operation ran; nothing was applied
    #[error("deadline lapsed before '{0}' ran; nothing applied")]
    DeadlineLapsed(&'static str),
}

impl CurationError {
    /// Returns the string code as defined in ERRORS.md
    pub fn code(&self) -> &'static str {
        match self {
            CurationError::RecommendationNotFound(_) => "BETA_REC_NOT_FOUND",
            CurationError::UnknownRubricVersion(_) => "BETA_UNKNOWN_RUBRIC_VERSION",
            CurationError::InvalidScore { .. } => "BETA_RUBRIC_SCORE_INVALID",
            CurationError::Capture(inner) => inner.code(),
            CurationError::DeadlineLapsed(_) => "BETA_DEADLINE_LAPSED",
        }
    }
}

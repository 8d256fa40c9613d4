//! Unified HTTP error mapping
//!
//! Every core error surfaces as a JSON body `{"error": {code, message}}`
//! with a status code derived from the error's meaning: stale/conflicting
//! writes are 409, lookups are 404, shape violations are 400, lapsed
//! deadlines are 503 (fail closed, caller retries).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::capture::CaptureError;
use crate::consensus::ConsensusError;
use crate::curation::CurationError;
use crate::rules::{RuleError, RuleErrorKind};
use crate::scenario::{ScenarioError, ScenarioErrorKind};

/// Wire shape of an error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// An API error: status code plus coded body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<ScenarioError> for ApiError {
    fn from(err: ScenarioError) -> Self {
        let status = match err.kind {
            ScenarioErrorKind::EpisodeNotFound | ScenarioErrorKind::StateNotFound => {
                StatusCode::NOT_FOUND
            }
            ScenarioErrorKind::ConcurrentAdvance
            | ScenarioErrorKind::EpisodeTerminal
            | ScenarioErrorKind::ForbiddenTransition => StatusCode::CONFLICT,
            ScenarioErrorKind::UnknownParamSet => StatusCode::BAD_REQUEST,
            ScenarioErrorKind::DeadlineLapsed => StatusCode::SERVICE_UNAVAILABLE,
        };
        Self::new(status, err.kind.code(), err.message)
    }
}

impl From<CaptureError> for ApiError {
    fn from(err: CaptureError) -> Self {
        let status = match &err {
            CaptureError::StaleState { .. } | CaptureError::CuratedImmutable(_) => {
                StatusCode::CONFLICT
            }
            CaptureError::Validation(_) => StatusCode::BAD_REQUEST,
            CaptureError::Scenario(inner) => return ApiError::from(inner.clone()),
            CaptureError::NotFound(_) => StatusCode::NOT_FOUND,
            CaptureError::DeadlineLapsed(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        Self::new(status, err.code(), err.to_string())
    }
}

impl From<CurationError> for ApiError {
    fn from(err: CurationError) -> Self {
        let status = match &err {
            CurationError::RecommendationNotFound(_) => StatusCode::NOT_FOUND,
            CurationError::UnknownRubricVersion(_) | CurationError::InvalidScore { .. } => {
                StatusCode::BAD_REQUEST
            }
            CurationError::Capture(inner) => return ApiError::from(inner.clone()),
            CurationError::DeadlineLapsed(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        Self::new(status, err.code(), err.to_string())
    }
}

impl From<ConsensusError> for ApiError {
    fn from(err: ConsensusError) -> Self {
        let (status, code) = match &err {
            ConsensusError::NotFound(_) => (StatusCode::NOT_FOUND, "BETA_CONSENSUS_NOT_FOUND"),
            ConsensusError::DeadlineLapsed(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "BETA_DEADLINE_LAPSED")
            }
        };
        Self::new(status, code, err.to_string())
    }
}

impl From<RuleError> for ApiError {
    fn from(err: RuleError) -> Self {
        let status = match err.kind {
            RuleErrorKind::RuleNotFound => StatusCode::NOT_FOUND,
            RuleErrorKind::ActiveLogicImmutable | RuleErrorKind::SupersededTerminal => {
                StatusCode::CONFLICT
            }
            RuleErrorKind::AuditWriteFailed => StatusCode::INTERNAL_SERVER_ERROR,
            RuleErrorKind::InvalidRule => StatusCode::BAD_REQUEST,
            RuleErrorKind::DeadlineLapsed => StatusCode::SERVICE_UNAVAILABLE,
        };
        Self::new(status, err.kind.code(), err.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concurrent_advance_is_conflict() {
        let api: ApiError = ScenarioError::concurrent_advance(1, 2).into();
        assert_eq!(api.status, StatusCode::CONFLICT);
        assert_eq!(api.code, "BETA_CONCURRENT_ADVANCE");
    }

    #[test]
    fn test_stale_state_is_conflict() {
        let api: ApiError = CaptureError::StaleState {
            episode_id: uuid::Uuid::nil(),
            t_index: 0,
            scenario_state_id: uuid::Uuid::nil(),
        }
        .into();
        assert_eq!(api.status, StatusCode::CONFLICT);
    }

    #[test]
    fn test_deadline_is_service_unavailable() {
        let api: ApiError = RuleError::deadline_lapsed("create_rule").into();
        assert_eq!(api.status, StatusCode::SERVICE_UNAVAILABLE);
    }
}

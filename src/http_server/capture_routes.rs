//! Expert capture HTTP routes

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::deadline_from;
use super::response::ApiError;
use axum::http::StatusCode;
use crate::capture::{ExpertRecommendation, RubricStatus, SubmitInput};
use crate::core::{ActorId, BetaLab};

#[derive(Debug, Deserialize)]
pub struct SubmitRecommendationRequest {
    /// Explicit expert identity; there is no ambient user context
    pub expert_id: String,
    #[serde(flatten)]
    pub input: SubmitInput,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct ListRawQuery {
    #[serde(default)]
    pub limit: Option<usize>,
    /// One of: pending, needs_review, rejected, curated
    #[serde(default)]
    pub rubric_status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RawCaseListResponse {
    pub cases: Vec<ExpertRecommendation>,
    pub total: usize,
}

/// Build the capture router.
pub fn capture_routes(lab: Arc<BetaLab>) -> Router {
    Router::new()
        .route("/recommendations", post(submit_recommendation))
        .route("/recommendations", get(list_raw_cases))
        .with_state(lab)
}

async fn submit_recommendation(
    State(lab): State<Arc<BetaLab>>,
    Json(request): Json<SubmitRecommendationRequest>,
) -> Result<Json<ExpertRecommendation>, ApiError> {
    let deadline = deadline_from(request.timeout_ms);
    let expert = ActorId::new(request.expert_id);
    let rec = lab.submit_recommendation(&expert, request.input, &deadline)?;
    Ok(Json(rec))
}

async fn list_raw_cases(
    State(lab): State<Arc<BetaLab>>,
    Query(query): Query<ListRawQuery>,
) -> Result<Json<RawCaseListResponse>, ApiError> {
    let status = match query.rubric_status.as_deref() {
        None => None,
        Some("pending") => Some(RubricStatus::Pending),
        Some("needs_review") => Some(RubricStatus::NeedsReview),
        Some("rejected") => Some(RubricStatus::Rejected),
        Some("curated") => Some(RubricStatus::Curated),
        Some(other) => {
            return Err(ApiError::new(
                StatusCode::BAD_REQUEST,
                "BETA_BAD_QUERY",
                format!("unknown rubric_status '{}'", other),
            ))
        }
    };
    let cases = lab.list_raw_cases(query.limit.unwrap_or(50), status);
    let total = cases.len();
    Ok(Json(RawCaseListResponse { cases, total }))
}

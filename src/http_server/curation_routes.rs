//! Curation HTTP routes

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::deadline_from;
use super::response::ApiError;
use crate::core::{ActorId, BetaLab};
use crate::curation::{LibraryCase, RubricScores};

#[derive(Debug, Deserialize)]
pub struct PromoteRequest {
    /// Explicit curator identity
    pub actor: String,
    pub expert_rec_id: Uuid,
    pub rubric_scores: RubricScores,
    #[serde(default)]
    pub rubric_version: Option<String>,
    #[serde(default)]
    pub curation_notes: Option<String>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct PromoteResponse {
    pub case_id: Option<Uuid>,
    pub is_curated: bool,
    pub rubric_total: f64,
    pub threshold: f64,
    pub rubric_version: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub curated_only: Option<bool>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub cases: Vec<LibraryCase>,
    pub total: usize,
}

/// Build the curation router.
pub fn curation_routes(lab: Arc<BetaLab>) -> Router {
    Router::new()
        .route("/cases/promote", post(promote_case))
        .route("/cases/search", get(search_cases))
        .with_state(lab)
}

async fn promote_case(
    State(lab): State<Arc<BetaLab>>,
    Json(request): Json<PromoteRequest>,
) -> Result<Json<PromoteResponse>, ApiError> {
    let deadline = deadline_from(request.timeout_ms);
    let outcome = lab.promote_case_to_curated(
        &ActorId::new(request.actor),
        request.expert_rec_id,
        request.rubric_scores,
        request.rubric_version.as_deref(),
        request.curation_notes,
        &deadline,
    )?;
    Ok(Json(PromoteResponse {
        case_id: outcome.case_id,
        is_curated: outcome.is_curated,
        rubric_total: outcome.rubric_total,
        threshold: outcome.threshold,
        rubric_version: outcome.rubric_version,
    }))
}

async fn search_cases(
    State(lab): State<Arc<BetaLab>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let cases = lab.search_cases(
        query.q.as_deref().unwrap_or(""),
        query.curated_only.unwrap_or(true),
        query.limit.unwrap_or(50),
    );
    let total = cases.len();
    Ok(Json(SearchResponse { cases, total }))
}

//! Consensus HTTP routes

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::deadline_from;
use super::response::ApiError;
use crate::consensus::ScenarioConsensus;
use crate::core::BetaLab;

#[derive(Debug, Deserialize)]
pub struct ComputeRequest {
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ComputeResponse {
    /// None while the scenario is below the expert-count threshold
    pub consensus: Option<ScenarioConsensus>,
    pub status: &'static str,
}

/// Build the consensus router.
pub fn consensus_routes(lab: Arc<BetaLab>) -> Router {
    Router::new()
        .route("/consensus/:scenario_state_id", get(get_consensus))
        .route("/consensus/:scenario_state_id/compute", post(compute))
        .route("/consensus/:scenario_state_id/process", post(mark_processed))
        .with_state(lab)
}

async fn compute(
    State(lab): State<Arc<BetaLab>>,
    Path(scenario_state_id): Path<Uuid>,
    Json(request): Json<ComputeRequest>,
) -> Result<Json<ComputeResponse>, ApiError> {
    let deadline = deadline_from(request.timeout_ms);
    let consensus = lab.try_consensus(scenario_state_id, &deadline)?;
    let status = if consensus.is_some() { "ready" } else { "pending" };
    Ok(Json(ComputeResponse { consensus, status }))
}

async fn get_consensus(
    State(lab): State<Arc<BetaLab>>,
    Path(scenario_state_id): Path<Uuid>,
) -> Result<Json<ScenarioConsensus>, ApiError> {
    lab.get_consensus(scenario_state_id).map(Json).ok_or_else(|| {
        ApiError::new(
            StatusCode::NOT_FOUND,
            "BETA_CONSENSUS_NOT_FOUND",
            format!("no consensus record for scenario state {}", scenario_state_id),
        )
    })
}

async fn mark_processed(
    State(lab): State<Arc<BetaLab>>,
    Path(scenario_state_id): Path<Uuid>,
) -> Result<Json<ScenarioConsensus>, ApiError> {
    Ok(Json(lab.mark_consensus_processed(scenario_state_id)?))
}

//! Scenario HTTP routes
//!
//! Endpoints for starting episodes, advancing them, and fetching states.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::deadline_from;
use super::response::ApiError;
use crate::core::BetaLab;
use crate::scenario::{Episode, PersonaBaseline, ScenarioState};

#[derive(Debug, Deserialize)]
pub struct StartEpisodeRequest {
    /// Pin the episode seed; drawn fresh when absent
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub param_set_id: Option<String>,
    #[serde(default)]
    pub persona: Option<PersonaBaseline>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct StartEpisodeResponse {
    pub episode: Episode,
    pub initial_state: ScenarioState,
}

#[derive(Debug, Deserialize)]
pub struct AdvanceRequest {
    /// Head `t_index` the caller last observed; enables the optimistic
    /// check. A lost race returns 409 and the caller refetches the head.
    #[serde(default)]
    pub expected_head: Option<u32>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct AdvanceResponse {
    pub state: ScenarioState,
    pub t_index: u32,
}

/// Build the scenario router.
pub fn scenario_routes(lab: Arc<BetaLab>) -> Router {
    Router::new()
        .route("/episodes", post(start_episode))
        .route("/episodes/:episode_id", get(get_episode))
        .route("/episodes/:episode_id/advance", post(advance_episode))
        .route("/episodes/:episode_id/states/:t_index", get(get_state))
        .with_state(lab)
}

async fn start_episode(
    State(lab): State<Arc<BetaLab>>,
    Json(request): Json<StartEpisodeRequest>,
) -> Result<Json<StartEpisodeResponse>, ApiError> {
    let deadline = deadline_from(request.timeout_ms);
    let (episode, initial_state) = lab.start_episode(
        request.seed,
        request.param_set_id.as_deref(),
        request.persona,
        &deadline,
    )?;
    Ok(Json(StartEpisodeResponse {
        episode,
        initial_state,
    }))
}

async fn get_episode(
    State(lab): State<Arc<BetaLab>>,
    Path(episode_id): Path<Uuid>,
) -> Result<Json<Episode>, ApiError> {
    Ok(Json(lab.get_episode(episode_id)?))
}

async fn get_state(
    State(lab): State<Arc<BetaLab>>,
    Path((episode_id, t_index)): Path<(Uuid, u32)>,
) -> Result<Json<ScenarioState>, ApiError> {
    Ok(Json(lab.get_scenario_state(episode_id, t_index)?))
}

async fn advance_episode(
    State(lab): State<Arc<BetaLab>>,
    Path(episode_id): Path<Uuid>,
    Json(request): Json<AdvanceRequest>,
) -> Result<Json<AdvanceResponse>, ApiError> {
    let deadline = deadline_from(request.timeout_ms);
    let state = lab.advance_episode(episode_id, request.expected_head, &deadline)?;
    let t_index = state.t_index;
    Ok(Json(AdvanceResponse { state, t_index }))
}

//! Rule administration and recommendation HTTP routes

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::deadline_from;
use super::response::ApiError;
use crate::core::{ActorId, BetaLab};
use crate::rules::{
    NewRule, RecommendationResponse, Rule, RuleAuditEntry, RuleUpdate, SessionState,
};

#[derive(Debug, Deserialize)]
pub struct CreateRuleRequest {
    /// Explicit administrator identity
    pub actor: String,
    pub rule: NewRule,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRuleRequest {
    pub actor: String,
    pub update: RuleUpdate,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleRuleRequest {
    pub actor: String,
    pub active: bool,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct SupersedeRequest {
    pub actor: String,
    pub old_id: Uuid,
    pub new_id: Uuid,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct SweepRequest {
    pub actor: String,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub deactivated: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    #[serde(default)]
    pub rule_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct AuditResponse {
    pub entries: Vec<RuleAuditEntry>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct RulesListResponse {
    pub rules: Vec<Rule>,
    pub total: usize,
}

/// Build the rules + recommendation router.
pub fn rules_routes(lab: Arc<BetaLab>) -> Router {
    Router::new()
        .route("/rules", post(create_rule))
        .route("/rules", get(list_rules))
        .route("/rules/audit", get(get_audit_log))
        .route("/rules/supersede", post(supersede_rule))
        .route("/rules/sweep_expired", post(sweep_expired))
        .route("/rules/:rule_id", get(get_rule))
        .route("/rules/:rule_id", patch(update_rule))
        .route("/rules/:rule_id/toggle", post(toggle_rule))
        .route("/recommendation", post(generate_recommendation))
        .with_state(lab)
}

async fn create_rule(
    State(lab): State<Arc<BetaLab>>,
    Json(request): Json<CreateRuleRequest>,
) -> Result<Json<Rule>, ApiError> {
    let deadline = deadline_from(request.timeout_ms);
    let rule = lab.create_rule(&ActorId::new(request.actor), request.rule, &deadline)?;
    Ok(Json(rule))
}

async fn list_rules(State(lab): State<Arc<BetaLab>>) -> Json<RulesListResponse> {
    let rules = lab.list_rules();
    let total = rules.len();
    Json(RulesListResponse { rules, total })
}

async fn get_rule(
    State(lab): State<Arc<BetaLab>>,
    Path(rule_id): Path<Uuid>,
) -> Result<Json<Rule>, ApiError> {
    Ok(Json(lab.get_rule(rule_id)?))
}

async fn update_rule(
    State(lab): State<Arc<BetaLab>>,
    Path(rule_id): Path<Uuid>,
    Json(request): Json<UpdateRuleRequest>,
) -> Result<Json<Rule>, ApiError> {
    let deadline = deadline_from(request.timeout_ms);
    let rule = lab.update_rule(
        &ActorId::new(request.actor),
        rule_id,
        request.update,
        &deadline,
    )?;
    Ok(Json(rule))
}

async fn toggle_rule(
    State(lab): State<Arc<BetaLab>>,
    Path(rule_id): Path<Uuid>,
    Json(request): Json<ToggleRuleRequest>,
) -> Result<Json<Rule>, ApiError> {
    let deadline = deadline_from(request.timeout_ms);
    let rule = lab.toggle_rule_active(
        &ActorId::new(request.actor),
        rule_id,
        request.active,
        &deadline,
    )?;
    Ok(Json(rule))
}

async fn supersede_rule(
    State(lab): State<Arc<BetaLab>>,
    Json(request): Json<SupersedeRequest>,
) -> Result<Json<Rule>, ApiError> {
    let deadline = deadline_from(request.timeout_ms);
    let rule = lab.supersede_rule(
        &ActorId::new(request.actor),
        request.old_id,
        request.new_id,
        &deadline,
    )?;
    Ok(Json(rule))
}

async fn sweep_expired(
    State(lab): State<Arc<BetaLab>>,
    Json(request): Json<SweepRequest>,
) -> Result<Json<SweepResponse>, ApiError> {
    let deadline = deadline_from(request.timeout_ms);
    let deactivated = lab.sweep_expired_rules(&ActorId::new(request.actor), &deadline)?;
    Ok(Json(SweepResponse { deactivated }))
}

async fn get_audit_log(
    State(lab): State<Arc<BetaLab>>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<AuditResponse>, ApiError> {
    let entries = lab.get_audit_log(query.rule_id)?;
    let total = entries.len();
    Ok(Json(AuditResponse { entries, total }))
}

async fn generate_recommendation(
    State(lab): State<Arc<BetaLab>>,
    Json(state): Json<SessionState>,
) -> Json<RecommendationResponse> {
    Json(lab.generate_recommendation(&state))
}

//! BetaLab service — wires the pipeline together
//!
//! One struct owns the simulator, the capture store, the curation gate,
//! the consensus aggregator, and the rule repository, and exposes the
//! operations the surrounding application calls. The HTTP layer and CLI
//! are thin adapters over this type; nothing in here knows about wire
//! formats.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use super::context::{ActorId, Deadline, ExpertId};
use crate::capture::{
    CaptureResult, CaptureStore, ExpertRecommendation, RubricStatus, SubmitInput,
};
use crate::config::BetaLabConfig;
use crate::consensus::{ConsensusAggregator, ConsensusResult, ScenarioConsensus};
use crate::curation::{CurationGate, CurationResult, LibraryCase, PromotionOutcome, RubricScores};
use crate::observability::{Event, Logger};
use crate::rules::{
    evaluate, FileAuditLog, MemoryAuditLog, NewRule, RecommendationResponse, Rule, RuleAuditEntry,
    RuleAuditLog, RuleRepository, RuleResult, RuleUpdate, SessionState,
};
use crate::scenario::{
    Episode, PersonaBaseline, ScenarioEngine, ScenarioResult, ScenarioState,
};

/// The assembled expert-capture and rule-learning core.
pub struct BetaLab {
    config: BetaLabConfig,
    engine: ScenarioEngine,
    capture: CaptureStore,
    curation: CurationGate,
    consensus: ConsensusAggregator,
    rules: RuleRepository,
}

impl BetaLab {
    /// Assemble an in-memory instance (memory-backed audit log).
    pub fn new(config: BetaLabConfig) -> Self {
        Self::with_audit_log(config, Arc::new(MemoryAuditLog::new()))
    }

    /// Assemble with a durable file-backed rule audit log under the
    /// configured data directory.
    pub fn open(config: BetaLabConfig) -> std::io::Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        let audit = FileAuditLog::open(config.audit_log_path())?;
        Ok(Self::with_audit_log(config, Arc::new(audit)))
    }

    /// Assemble with an explicit audit log implementation.
    pub fn with_audit_log(config: BetaLabConfig, audit: Arc<dyn RuleAuditLog>) -> Self {
        let engine = ScenarioEngine::with_max_steps(config.scenario.max_steps);
        let curation = CurationGate::new(config.curation.clone());
        let consensus = ConsensusAggregator::new(config.consensus.clone());
        let rules = RuleRepository::new(audit);
        Self {
            config,
            engine,
            capture: CaptureStore::new(),
            curation,
            consensus,
            rules,
        }
    }

    /// The configuration this instance was assembled with.
    pub fn config(&self) -> &BetaLabConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Scenario simulator
    // ------------------------------------------------------------------

    /// Start an episode and derive its initial state.
    pub fn start_episode(
        &self,
        seed: Option<u64>,
        param_set_id: Option<&str>,
        persona: Option<PersonaBaseline>,
        deadline: &Deadline,
    ) -> ScenarioResult<(Episode, ScenarioState)> {
        let result = self.engine.start_episode(seed, param_set_id, persona, deadline)?;
        Logger::info(
            Event::EpisodeStarted.as_str(),
            &[
                ("episode_id", &result.0.episode_id.to_string()),
                ("seed", &result.0.rng_seed.to_string()),
                ("param_set", &result.0.param_set_id),
            ],
        );
        Ok(result)
    }

    /// Pure lookup of a scenario state.
    pub fn get_scenario_state(&self, episode_id: Uuid, t_index: u32) -> ScenarioResult<ScenarioState> {
        self.engine.get_state(episode_id, t_index)
    }

    /// Episode record lookup.
    pub fn get_episode(&self, episode_id: Uuid) -> ScenarioResult<Episode> {
        self.engine.get_episode(episode_id)
    }

    /// Advance an episode one step.
    pub fn advance_episode(
        &self,
        episode_id: Uuid,
        expected_head: Option<u32>,
        deadline: &Deadline,
    ) -> ScenarioResult<ScenarioState> {
        match self.engine.advance_episode(episode_id, expected_head, deadline) {
            Ok(state) => {
                Logger::info(
                    Event::EpisodeAdvanced.as_str(),
                    &[
                        ("episode_id", &episode_id.to_string()),
                        ("t_index", &state.t_index.to_string()),
                    ],
                );
                Ok(state)
            }
            Err(err) => {
                if err.kind == crate::scenario::ScenarioErrorKind::ConcurrentAdvance {
                    Logger::warn(
                        Event::AdvanceConflict.as_str(),
                        &[("episode_id", &episode_id.to_string())],
                    );
                }
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------
    // Expert capture
    // ------------------------------------------------------------------

    /// Submit an expert recommendation against the episode's head state.
    pub fn submit_recommendation(
        &self,
        expert_id: &ExpertId,
        input: SubmitInput,
        deadline: &Deadline,
    ) -> CaptureResult<ExpertRecommendation> {
        let head = self.engine.head_state(input.episode_id)?;
        match self.capture.submit(expert_id, input, &head, deadline) {
            Ok(rec) => {
                Logger::info(
                    Event::RecommendationCaptured.as_str(),
                    &[
                        ("expert_rec_id", &rec.expert_rec_id.to_string()),
                        ("expert_id", expert_id.as_str()),
                        ("action_id", rec.action_id.as_str()),
                    ],
                );
                Ok(rec)
            }
            Err(err @ crate::capture::CaptureError::StaleState { .. }) => {
                Logger::warn(
                    Event::StaleSubmissionRejected.as_str(),
                    &[("expert_id", expert_id.as_str())],
                );
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// List raw cases, optionally filtered by rubric status.
    pub fn list_raw_cases(
        &self,
        limit: usize,
        status: Option<RubricStatus>,
    ) -> Vec<ExpertRecommendation> {
        self.capture.list_raw(limit, status)
    }

    /// Fetch one raw case.
    pub fn get_raw_case(&self, expert_rec_id: Uuid) -> CaptureResult<ExpertRecommendation> {
        self.capture.get(expert_rec_id)
    }

    // ------------------------------------------------------------------
    // Curation
    // ------------------------------------------------------------------

    /// Rubric-score a raw case and promote it if it clears threshold.
    pub fn promote_case_to_curated(
        &self,
        actor: &ActorId,
        expert_rec_id: Uuid,
        scores: RubricScores,
        rubric_version: Option<&str>,
        curation_notes: Option<String>,
        deadline: &Deadline,
    ) -> CurationResult<PromotionOutcome> {
        let outcome = self.curation.promote_case_to_curated(
            actor,
            &self.capture,
            expert_rec_id,
            scores,
            rubric_version,
            curation_notes,
            deadline,
        )?;
        let event = if outcome.is_curated {
            Event::CasePromoted
        } else {
            Event::CaseHeldForReview
        };
        Logger::info(
            event.as_str(),
            &[
                ("expert_rec_id", &expert_rec_id.to_string()),
                ("rubric_total", &format!("{:.3}", outcome.rubric_total)),
            ],
        );
        Ok(outcome)
    }

    /// Search the curated case library.
    pub fn search_cases(&self, q: &str, curated_only: bool, limit: usize) -> Vec<LibraryCase> {
        self.curation.search_cases(q, curated_only, limit)
    }

    // ------------------------------------------------------------------
    // Consensus
    // ------------------------------------------------------------------

    /// Aggregate expert responses for a scenario, if enough exist.
    pub fn try_consensus(
        &self,
        scenario_state_id: Uuid,
        deadline: &Deadline,
    ) -> ConsensusResult<Option<ScenarioConsensus>> {
        let result = self
            .consensus
            .try_aggregate(&self.capture, scenario_state_id, deadline)?;
        if let Some(record) = &result {
            Logger::info(
                Event::ConsensusComputed.as_str(),
                &[
                    ("scenario_state_id", &scenario_state_id.to_string()),
                    ("n_experts", &record.n_experts.to_string()),
                    ("agreement", &format!("{:.3}", record.agreement)),
                ],
            );
        }
        Ok(result)
    }

    /// Stored consensus record, if any.
    pub fn get_consensus(&self, scenario_state_id: Uuid) -> Option<ScenarioConsensus> {
        self.consensus.get(scenario_state_id)
    }

    /// Freeze a consensus record into priors.
    pub fn mark_consensus_processed(
        &self,
        scenario_state_id: Uuid,
    ) -> ConsensusResult<ScenarioConsensus> {
        let record = self.consensus.mark_processed(scenario_state_id)?;
        Logger::info(
            Event::ConsensusProcessed.as_str(),
            &[("scenario_state_id", &scenario_state_id.to_string())],
        );
        Ok(record)
    }

    // ------------------------------------------------------------------
    // Rule administration
    // ------------------------------------------------------------------

    /// Create a rule (audited).
    pub fn create_rule(
        &self,
        actor: &ActorId,
        input: NewRule,
        deadline: &Deadline,
    ) -> RuleResult<Rule> {
        let rule = self.rules.create_rule(actor, input, deadline)?;
        Logger::info(
            Event::RuleCreated.as_str(),
            &[("rule_id", &rule.id.to_string()), ("name", &rule.name)],
        );
        Ok(rule)
    }

    /// Update rule metadata (audited).
    pub fn update_rule(
        &self,
        actor: &ActorId,
        rule_id: Uuid,
        update: RuleUpdate,
        deadline: &Deadline,
    ) -> RuleResult<Rule> {
        let rule = self.rules.update_rule(actor, rule_id, update, deadline)?;
        Logger::info(Event::RuleModified.as_str(), &[("rule_id", &rule_id.to_string())]);
        Ok(rule)
    }

    /// Flip a rule's active flag (audited when it changes state).
    pub fn toggle_rule_active(
        &self,
        actor: &ActorId,
        rule_id: Uuid,
        active: bool,
        deadline: &Deadline,
    ) -> RuleResult<Rule> {
        let rule = self.rules.toggle_rule_active(actor, rule_id, active, deadline)?;
        let event = if active {
            Event::RuleActivated
        } else {
            Event::RuleDeactivated
        };
        Logger::info(event.as_str(), &[("rule_id", &rule_id.to_string())]);
        Ok(rule)
    }

    /// Supersede a rule (audited).
    pub fn supersede_rule(
        &self,
        actor: &ActorId,
        old_id: Uuid,
        new_id: Uuid,
        deadline: &Deadline,
    ) -> RuleResult<Rule> {
        let rule = self.rules.supersede(actor, old_id, new_id, deadline)?;
        Logger::info(
            Event::RuleSuperseded.as_str(),
            &[
                ("old_id", &old_id.to_string()),
                ("new_id", &new_id.to_string()),
            ],
        );
        Ok(rule)
    }

    /// Housekeeping: deactivate expired rules.
    pub fn sweep_expired_rules(
        &self,
        actor: &ActorId,
        deadline: &Deadline,
    ) -> RuleResult<Vec<Uuid>> {
        let flipped = self.rules.sweep_expired(actor, Utc::now(), deadline)?;
        Logger::info(
            Event::ExpirySweepComplete.as_str(),
            &[("flipped", &flipped.len().to_string())],
        );
        Ok(flipped)
    }

    /// Fetch a rule.
    pub fn get_rule(&self, rule_id: Uuid) -> RuleResult<Rule> {
        self.rules.get_rule(rule_id)
    }

    /// All rules, creation order.
    pub fn list_rules(&self) -> Vec<Rule> {
        self.rules.list_rules()
    }

    /// Audit log, optionally filtered to one rule.
    pub fn get_audit_log(&self, rule_id: Option<Uuid>) -> RuleResult<Vec<RuleAuditEntry>> {
        self.rules.get_audit_log(rule_id)
    }

    // ------------------------------------------------------------------
    // Serving
    // ------------------------------------------------------------------

    /// Evaluate a live pre-session state against the current rule snapshot.
    pub fn generate_recommendation(&self, state: &SessionState) -> RecommendationResponse {
        let snapshot = self.rules.snapshot(Utc::now());
        let response = evaluate(state, &snapshot, &self.config.evaluation);
        Logger::info(
            Event::EvaluationServed.as_str(),
            &[
                ("matched", &response.matched_rules.len().to_string()),
                ("warnings", &response.warnings.len().to_string()),
            ],
        );
        response
    }
}

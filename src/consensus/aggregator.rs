//! Consensus aggregator
//!
//! Per CONSENSUS.md:
//! - N1: below `min_experts` complete responses a scenario has NO consensus
//!   record and stays pending — that is a normal outcome, not an error
//! - N2: agreement = 1 − normalized dispersion, clamped to [0, 1]
//! - N3: a record marked `processed_into_priors` is immutable; later
//!   aggregation calls return it unchanged

use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use thiserror::Error;
use uuid::Uuid;

use super::policy::{dispersion, ConsensusPolicy, DEFAULT_CONFIDENCE};
use super::record::ScenarioConsensus;
use crate::capture::{CaptureStore, ExpertRecommendation, SessionType};
use crate::core::Deadline;

/// Half the unit quality scale; two maximally split experts normalize to
/// agreement ≈ 0.
const DISPERSION_SCALE: f64 = 0.5;

/// Result type for consensus operations
pub type ConsensusResult<T> = Result<T, ConsensusError>;

/// Consensus errors
#[derive(Debug, Clone, Error)]
pub enum ConsensusError {
    /// No consensus record exists for the scenario
    #[error("no consensus record for scenario state {0}")]
    NotFound(Uuid),

    /// Caller deadline lapsed before the operation ran; nothing was applied
    #[error("deadline lapsed before '{0}' ran; nothing applied")]
    DeadlineLapsed(&'static str),
}

/// Aggregator configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ConsensusConfig {
    #[serde(default)]
    pub policy: ConsensusPolicy,
    /// Minimum complete responses before a consensus record exists (N1)
    #[serde(default = "default_min_experts")]
    pub min_experts: u32,
    /// Spread beyond which a key driver is disputed
    #[serde(default = "default_dispute_tolerance")]
    pub dispute_tolerance: f64,
}

fn default_min_experts() -> u32 {
    2
}

fn default_dispute_tolerance() -> f64 {
    0.25
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            policy: ConsensusPolicy::default(),
            min_experts: 2,
            dispute_tolerance: 0.25,
        }
    }
}

/// The consensus aggregator and its record store.
pub struct ConsensusAggregator {
    config: ConsensusConfig,
    records: Mutex<HashMap<Uuid, ScenarioConsensus>>,
}

impl ConsensusAggregator {
    pub fn new(config: ConsensusConfig) -> Self {
        Self {
            config,
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Aggregate the complete responses for a scenario, if enough exist.
    ///
    /// Returns `Ok(None)` below the expert-count threshold (N1). Once the
    /// stored record is processed into priors it is returned unchanged
    /// regardless of newer submissions (N3).
    pub fn try_aggregate(
        &self,
        capture: &CaptureStore,
        scenario_state_id: Uuid,
        deadline: &Deadline,
    ) -> ConsensusResult<Option<ScenarioConsensus>> {
        if deadline.lapsed() {
            return Err(ConsensusError::DeadlineLapsed("try_aggregate"));
        }

        let mut records = self.records.lock().unwrap();
        if let Some(existing) = records.get(&scenario_state_id) {
            if existing.processed_into_priors {
                return Ok(Some(existing.clone()));
            }
        }

        let responses: Vec<ExpertRecommendation> = capture
            .for_state(scenario_state_id)
            .into_iter()
            .filter(|rec| rec.is_complete())
            .collect();

        if (responses.len() as u32) < self.config.min_experts {
            return Ok(None);
        }

        let record = self.compute(scenario_state_id, &responses);
        records.insert(scenario_state_id, record.clone());
        Ok(Some(record))
    }

    /// Fetch the stored consensus record for a scenario, if any.
    pub fn get(&self, scenario_state_id: Uuid) -> Option<ScenarioConsensus> {
        self.records
            .lock()
            .unwrap()
            .get(&scenario_state_id)
            .cloned()
    }

    /// Mark a record as folded into priors, freezing it (N3). Idempotent.
    pub fn mark_processed(&self, scenario_state_id: Uuid) -> ConsensusResult<ScenarioConsensus> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(&scenario_state_id)
            .ok_or(ConsensusError::NotFound(scenario_state_id))?;
        record.processed_into_priors = true;
        Ok(record.clone())
    }

    fn compute(
        &self,
        scenario_state_id: Uuid,
        responses: &[ExpertRecommendation],
    ) -> ScenarioConsensus {
        // `responses` arrives sorted by expert id (capture store contract),
        // so every step below is deterministic.
        let samples: Vec<(f64, f64)> = responses
            .iter()
            .map(|rec| {
                let outcomes = rec.predicted_outcomes.as_ref().expect("complete response");
                (outcomes.quality, rec.confidence.unwrap_or(DEFAULT_CONFIDENCE))
            })
            .collect();

        let qualities: Vec<f64> = samples.iter().map(|(q, _)| *q).collect();
        let consensus_quality = self.config.policy.central(&samples);

        let agreement =
            (1.0 - dispersion(&qualities) / DISPERSION_SCALE).clamp(0.0, 1.0);

        let session_type = modal_session_type(responses);

        let mut disputed_factors = Vec::new();
        for (factor, values) in [
            ("quality", qualities.clone()),
            (
                "fatigue_after",
                responses
                    .iter()
                    .map(|r| r.predicted_outcomes.as_ref().expect("complete").fatigue_after)
                    .collect(),
            ),
            (
                "injury_risk",
                responses
                    .iter()
                    .map(|r| r.predicted_outcomes.as_ref().expect("complete").injury_risk)
                    .collect(),
            ),
        ] {
            if spread(&values) > self.config.dispute_tolerance {
                disputed_factors.push(factor.to_string());
            }
        }
        let distinct_types = responses
            .iter()
            .map(|r| r.session_type)
            .collect::<std::collections::BTreeSet<_>>();
        if distinct_types.len() > 1 {
            disputed_factors.push("session_type".to_string());
        }

        // Also count divergent plans themselves as disagreement: different
        // action ids mean the experts did not converge on a prescription.
        let distinct_actions = responses
            .iter()
            .map(|r| r.action_id.as_str())
            .collect::<std::collections::BTreeSet<_>>();
        if distinct_actions.len() > 1 {
            disputed_factors.push("plan".to_string());
        }

        ScenarioConsensus {
            scenario_state_id,
            consensus_quality,
            session_type,
            treatment_recommendations: majority_tags(responses),
            agreement,
            n_experts: responses.len() as u32,
            disputed_factors,
            processed_into_priors: false,
            computed_at: Utc::now(),
        }
    }
}

impl Default for ConsensusAggregator {
    fn default() -> Self {
        Self::new(ConsensusConfig::default())
    }
}

/// Modal session type; ties broken by the highest-confidence respondent
/// among the tied types, then by type order for full determinism.
fn modal_session_type(responses: &[ExpertRecommendation]) -> SessionType {
    let mut votes: BTreeMap<SessionType, (u32, f64)> = BTreeMap::new();
    for rec in responses {
        let confidence = rec.confidence.unwrap_or(DEFAULT_CONFIDENCE);
        let entry = votes.entry(rec.session_type).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 = entry.1.max(confidence);
    }
    votes
        .iter()
        .max_by(|a, b| {
            (a.1 .0)
                .cmp(&b.1 .0)
                .then(a.1 .1.total_cmp(&b.1 .1))
                .then(b.0.cmp(a.0))
        })
        .map(|(t, _)| *t)
        .expect("non-empty responses")
}

/// Rationale tags used by a strict majority of respondents, sorted.
fn majority_tags(responses: &[ExpertRecommendation]) -> Vec<String> {
    let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
    for rec in responses {
        for tag in &rec.rationale_tags {
            *counts.entry(tag.as_str()).or_insert(0) += 1;
        }
    }
    let majority = (responses.len() as u32) / 2 + 1;
    counts
        .into_iter()
        .filter(|(_, n)| *n >= majority)
        .map(|(tag, _)| tag.to_string())
        .collect()
}

fn spread(values: &[f64]) -> f64 {
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if min.is_finite() && max.is_finite() {
        max - min
    } else {
        0.0
    }
}

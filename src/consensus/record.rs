//! ScenarioConsensus — the aggregate judgment for one scenario
//!
//! Pure data container. Aggregation math lives in `aggregator.rs`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::capture::SessionType;

/// Aggregate of expert judgments for one scenario state.
///
/// Per CONSENSUS.md §N3: once `processed_into_priors` is set the record is
/// immutable — it is the exact input the prior update consumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConsensus {
    pub scenario_state_id: Uuid,

    /// Central tendency of predicted quality across experts
    pub consensus_quality: f64,
    /// Modal session type, ties broken by highest-confidence respondent
    pub session_type: SessionType,
    /// Rationale tags shared by a majority of respondents
    pub treatment_recommendations: Vec<String>,

    /// 1 − normalized dispersion, in [0, 1]
    pub agreement: f64,
    pub n_experts: u32,
    /// Key drivers where expert judgments diverge beyond tolerance
    pub disputed_factors: Vec<String>,

    pub processed_into_priors: bool,
    pub computed_at: DateTime<Utc>,
}

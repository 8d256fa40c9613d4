//! LibraryCase — a curated case record
//!
//! Created ONLY by promotion. Never edited after creation except to be
//! superseded by a newer case (G1). Pure data container; gating logic
//! lives in `gate.rs`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::canon::{ActionId, DoseFeatures, WorkoutPlan};
use crate::capture::PredictedOutcomes;
use crate::core::ActorId;

/// A curated case: the only data trusted for downstream prior updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryCase {
    pub case_id: Uuid,
    /// The raw recommendation this case was promoted from
    pub expert_rec_id: Uuid,
    pub action_id: ActionId,
    pub plan: WorkoutPlan,
    pub dose_features: DoseFeatures,
    pub rationale_tags: Vec<String>,
    pub predicted_outcomes: Option<PredictedOutcomes>,

    /// Weighted rubric total that cleared the gate
    pub rubric_total: f64,
    pub rubric_version: String,
    pub curation_notes: Option<String>,
    pub curated_by: ActorId,

    pub is_curated: bool,
    pub curated_at: DateTime<Utc>,
    /// Set when a newer case replaces this one
    pub superseded_by: Option<Uuid>,
}

//! ExpertRecommendation — one raw expert decision per (episode, expert, step)
//!
//! Pure data containers. Upsert and head-state enforcement live in
//! `store.rs`; rubric gating lives in the curation module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::canon::{ActionId, Activity, DoseFeatures, WorkoutPlan};
use crate::core::ExpertId;

/// Rubric review status of a raw recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RubricStatus {
    /// Captured, not yet reviewed
    Pending,
    /// Scored below threshold; awaiting human re-review, never auto-retried
    NeedsReview,
    /// Explicitly rejected; kept inspectable
    Rejected,
    /// Promoted into the curated library (one-way)
    Curated,
}

impl RubricStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RubricStatus::Pending => "pending",
            RubricStatus::NeedsReview => "needs_review",
            RubricStatus::Rejected => "rejected",
            RubricStatus::Curated => "curated",
        }
    }
}

/// Session type implied by a plan, used for consensus voting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    Climbing,
    Strength,
    Endurance,
    Mobility,
    Rest,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Climbing => "climbing",
            SessionType::Strength => "strength",
            SessionType::Endurance => "endurance",
            SessionType::Mobility => "mobility",
            SessionType::Rest => "rest",
        }
    }

    /// Derive the dominant session type of a plan.
    ///
    /// Deterministic: counts prescribed items per type; ties resolve to the
    /// enum's declaration order (climbing first).
    pub fn of_plan(plan: &WorkoutPlan) -> Self {
        let mut counts = [0u32; 5];
        for item in plan.items() {
            let idx = match item {
                Activity::Climbing(_) => 0,
                Activity::Strength(_) => 1,
                Activity::Endurance(_) => 2,
                Activity::Mobility(_) => 3,
                Activity::Rest(_) => 4,
            };
            counts[idx] += 1;
        }
        let best = counts
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))
            .map(|(i, _)| i)
            .unwrap_or(4);
        match best {
            0 => SessionType::Climbing,
            1 => SessionType::Strength,
            2 => SessionType::Endurance,
            3 => SessionType::Mobility,
            _ => SessionType::Rest,
        }
    }
}

/// Outcomes the expert predicts for their plan, unit-scaled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictedOutcomes {
    /// Predicted session quality in [0, 1]
    pub quality: f64,
    /// Predicted fatigue after the session in [0, 1]
    pub fatigue_after: f64,
    /// Predicted injury risk in [0, 1]
    pub injury_risk: f64,
}

/// Input to `submit_recommendation`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitInput {
    pub episode_id: Uuid,
    pub t_index: u32,
    pub scenario_state_id: Uuid,
    /// Raw plan payload; validated and canonicalized at the boundary
    pub planned_workout: Value,
    #[serde(default)]
    pub rationale_tags: Vec<String>,
    #[serde(default)]
    pub noticed_signals: Vec<String>,
    #[serde(default)]
    pub avoided_risks: Vec<String>,
    #[serde(default)]
    pub predicted_outcomes: Option<PredictedOutcomes>,
    /// Expert's confidence in their own judgment, [0, 1]
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// One raw expert recommendation.
///
/// Unique on `(episode_id, expert_id, t_index)`; resubmission by the same
/// expert for the same step overwrites in place, keeping the row identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpertRecommendation {
    pub expert_rec_id: Uuid,
    pub episode_id: Uuid,
    pub expert_id: ExpertId,
    pub t_index: u32,
    pub scenario_state_id: Uuid,

    /// Canonical action hash; the cross-expert join key
    pub action_id: ActionId,
    pub planned_workout: WorkoutPlan,
    /// Materialized at capture so downstream never re-parses plan JSON
    pub planned_dose_features: DoseFeatures,
    pub session_type: SessionType,

    pub rationale_tags: Vec<String>,
    pub noticed_signals: Vec<String>,
    pub avoided_risks: Vec<String>,
    pub predicted_outcomes: Option<PredictedOutcomes>,
    pub confidence: Option<f64>,

    pub rubric_status: RubricStatus,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExpertRecommendation {
    /// A response is complete enough for consensus when the expert attached
    /// predicted outcomes.
    pub fn is_complete(&self) -> bool {
        self.predicted_outcomes.is_some()
    }
}

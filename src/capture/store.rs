//! Expert capture store
//!
//! Per CONCURRENCY.md §2:
//! - One row per `(episode, expert, t_index)`; a second submission from the
//!   same expert for the same step OVERWRITES, never duplicates (X1)
//! - Submissions are validated against the current head state; stale
//!   submissions are rejected before anything is written (X2)
//! - Dose features are materialized alongside the raw plan (X3)
//! - Concurrent upserts from different experts carry no ordering
//!   requirement; the single store lock serializes them

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use super::errors::{CaptureError, CaptureResult};
use super::recommendation::{ExpertRecommendation, RubricStatus, SessionType, SubmitInput};
use crate::canon;
use crate::core::{Deadline, ExpertId};
use crate::scenario::ScenarioState;

/// Key of the unique (episode, expert, step) triple.
type RecKey = (Uuid, ExpertId, u32);

/// In-memory expert capture store.
pub struct CaptureStore {
    inner: Mutex<StoreInner>,
}

struct StoreInner {
    /// Rows keyed by the unique triple
    recs: HashMap<RecKey, ExpertRecommendation>,
    /// Secondary index: rec id → triple
    by_id: HashMap<Uuid, RecKey>,
}

impl CaptureStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                recs: HashMap::new(),
                by_id: HashMap::new(),
            }),
        }
    }

    /// Submit (or resubmit) a recommendation.
    ///
    /// `head` is the engine's current head state for the episode. The
    /// submission must reference exactly that state: wrong id or wrong step
    /// is a stale submission (X2) and nothing is written.
    ///
    /// Validation and canonicalization happen BEFORE the store lock is
    /// taken; a schema-violating plan is never stored (C1).
    pub fn submit(
        &self,
        expert_id: &ExpertId,
        input: SubmitInput,
        head: &ScenarioState,
        deadline: &Deadline,
    ) -> CaptureResult<ExpertRecommendation> {
        if deadline.lapsed() {
            return Err(CaptureError::DeadlineLapsed("submit_recommendation"));
        }

        if input.episode_id != head.episode_id
            || input.t_index != head.t_index
            || input.scenario_state_id != head.scenario_state_id
        {
            return Err(CaptureError::StaleState {
                episode_id: input.episode_id,
                t_index: input.t_index,
                scenario_state_id: input.scenario_state_id,
            });
        }

        let action = canon::canonicalize(&input.planned_workout)?;
        let session_type = SessionType::of_plan(&action.plan);
        let now = Utc::now();

        let mut inner = self.inner.lock().unwrap();
        let key: RecKey = (input.episode_id, expert_id.clone(), input.t_index);

        let rec = match inner.recs.get_mut(&key) {
            Some(existing) => {
                // Promotion is one-way: a curated row's content is frozen (G1)
                if existing.rubric_status == RubricStatus::Curated {
                    return Err(CaptureError::CuratedImmutable(existing.expert_rec_id));
                }
                existing.scenario_state_id = input.scenario_state_id;
                existing.action_id = action.action_id;
                existing.planned_workout = action.plan;
                existing.planned_dose_features = action.dose_features;
                existing.session_type = session_type;
                existing.rationale_tags = input.rationale_tags;
                existing.noticed_signals = input.noticed_signals;
                existing.avoided_risks = input.avoided_risks;
                existing.predicted_outcomes = input.predicted_outcomes;
                existing.confidence = input.confidence;
                existing.rubric_status = RubricStatus::Pending;
                existing.updated_at = now;
                existing.clone()
            }
            None => {
                let rec = ExpertRecommendation {
                    expert_rec_id: Uuid::new_v4(),
                    episode_id: input.episode_id,
                    expert_id: expert_id.clone(),
                    t_index: input.t_index,
                    scenario_state_id: input.scenario_state_id,
                    action_id: action.action_id,
                    planned_workout: action.plan,
                    planned_dose_features: action.dose_features,
                    session_type,
                    rationale_tags: input.rationale_tags,
                    noticed_signals: input.noticed_signals,
                    avoided_risks: input.avoided_risks,
                    predicted_outcomes: input.predicted_outcomes,
                    confidence: input.confidence,
                    rubric_status: RubricStatus::Pending,
                    submitted_at: now,
                    updated_at: now,
                };
                inner.by_id.insert(rec.expert_rec_id, key.clone());
                inner.recs.insert(key, rec.clone());
                rec
            }
        };

        Ok(rec)
    }

    /// Fetch a recommendation by id.
    pub fn get(&self, expert_rec_id: Uuid) -> CaptureResult<ExpertRecommendation> {
        let inner = self.inner.lock().unwrap();
        inner
            .by_id
            .get(&expert_rec_id)
            .and_then(|key| inner.recs.get(key))
            .cloned()
            .ok_or(CaptureError::NotFound(expert_rec_id))
    }

    /// Count of rows for one (episode, expert, step) triple. Always 0 or 1.
    pub fn row_count(&self, episode_id: Uuid, expert_id: &ExpertId, t_index: u32) -> usize {
        let inner = self.inner.lock().unwrap();
        usize::from(
            inner
                .recs
                .contains_key(&(episode_id, expert_id.clone(), t_index)),
        )
    }

    /// List raw cases, newest first, optionally filtered by rubric status.
    ///
    /// Ordering is deterministic: `(updated_at, expert_rec_id)` descending.
    pub fn list_raw(
        &self,
        limit: usize,
        status: Option<RubricStatus>,
    ) -> Vec<ExpertRecommendation> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<ExpertRecommendation> = inner
            .recs
            .values()
            .filter(|rec| status.map_or(true, |s| rec.rubric_status == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then(b.expert_rec_id.cmp(&a.expert_rec_id))
        });
        rows.truncate(limit);
        rows
    }

    /// All recommendations attached to one scenario state.
    pub fn for_state(&self, scenario_state_id: Uuid) -> Vec<ExpertRecommendation> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<ExpertRecommendation> = inner
            .recs
            .values()
            .filter(|rec| rec.scenario_state_id == scenario_state_id)
            .cloned()
            .collect();
        // Deterministic order for aggregation
        rows.sort_by(|a, b| a.expert_id.as_str().cmp(b.expert_id.as_str()));
        rows
    }

    /// Update the rubric status of a row. Used only by the curation gate.
    ///
    /// Per CURATION.md §G1 the Curated status is terminal: any attempt to
    /// move off it is rejected.
    pub fn set_rubric_status(
        &self,
        expert_rec_id: Uuid,
        status: RubricStatus,
    ) -> CaptureResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let key = inner
            .by_id
            .get(&expert_rec_id)
            .cloned()
            .ok_or(CaptureError::NotFound(expert_rec_id))?;
        let rec = inner
            .recs
            .get_mut(&key)
            .ok_or(CaptureError::NotFound(expert_rec_id))?;

        if rec.rubric_status == RubricStatus::Curated && status != RubricStatus::Curated {
            return Err(CaptureError::CuratedImmutable(expert_rec_id));
        }
        rec.rubric_status = status;
        Ok(())
    }
}

impl Default for CaptureStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ActorId;
    use crate::scenario::{PersonaBaseline, TransitionParamSet};
    use serde_json::json;

    fn head_state() -> ScenarioState {
        crate::scenario::initial_state(
            Uuid::new_v4(),
            42,
            "test-engine/1",
            PersonaBaseline::default(),
            &TransitionParamSet::default_set(),
        )
    }

    fn plan_payload(attempts: u32) -> serde_json::Value {
        json!({
            "name": "limit day",
            "phases": [{
                "name": "main",
                "blocks": [{
                    "name": "limit",
                    "items": [{
                        "activity": "climbing",
                        "style": "boulder",
                        "attempts": attempts,
                        "intensity": 0.9,
                        "rest_between_s": 180
                    }]
                }]
            }]
        })
    }

    fn input_for(head: &ScenarioState, attempts: u32) -> SubmitInput {
        SubmitInput {
            episode_id: head.episode_id,
            t_index: head.t_index,
            scenario_state_id: head.scenario_state_id,
            planned_workout: plan_payload(attempts),
            rationale_tags: vec!["fresh".into()],
            noticed_signals: vec![],
            avoided_risks: vec![],
            predicted_outcomes: None,
            confidence: Some(0.8),
        }
    }

    #[test]
    fn test_submit_stores_materialized_features() {
        let store = CaptureStore::new();
        let head = head_state();
        let expert = ActorId::new("expert-a");

        let rec = store
            .submit(&expert, input_for(&head, 12), &head, &Deadline::none())
            .unwrap();

        assert_eq!(rec.planned_dose_features.hi_attempts, 12);
        assert_eq!(rec.rubric_status, RubricStatus::Pending);
        assert_eq!(rec.session_type, SessionType::Climbing);
    }

    #[test]
    fn test_resubmission_overwrites_not_duplicates() {
        let store = CaptureStore::new();
        let head = head_state();
        let expert = ActorId::new("expert-a");

        let first = store
            .submit(&expert, input_for(&head, 12), &head, &Deadline::none())
            .unwrap();
        let second = store
            .submit(&expert, input_for(&head, 8), &head, &Deadline::none())
            .unwrap();

        assert_eq!(
            store.row_count(head.episode_id, &expert, head.t_index),
            1,
            "X1 VIOLATION: duplicate row for same (episode, expert, step)"
        );
        // Row identity is stable across upserts
        assert_eq!(first.expert_rec_id, second.expert_rec_id);
        assert_eq!(second.planned_dose_features.hi_attempts, 8);
    }

    #[test]
    fn test_stale_state_rejected() {
        let store = CaptureStore::new();
        let head = head_state();
        let expert = ActorId::new("expert-a");

        let mut input = input_for(&head, 12);
        input.scenario_state_id = Uuid::new_v4();

        let err = store
            .submit(&expert, input, &head, &Deadline::none())
            .unwrap_err();
        assert!(matches!(err, CaptureError::StaleState { .. }));
        assert_eq!(store.row_count(head.episode_id, &expert, head.t_index), 0);
    }

    #[test]
    fn test_invalid_plan_never_stored() {
        let store = CaptureStore::new();
        let head = head_state();
        let expert = ActorId::new("expert-a");

        let mut input = input_for(&head, 12);
        input.planned_workout = json!({ "name": "bad", "phases": [] });

        let err = store
            .submit(&expert, input, &head, &Deadline::none())
            .unwrap_err();
        assert!(matches!(err, CaptureError::Validation(_)));
        assert_eq!(store.row_count(head.episode_id, &expert, head.t_index), 0);
    }

    #[test]
    fn test_different_experts_distinct_rows() {
        let store = CaptureStore::new();
        let head = head_state();

        store
            .submit(
                &ActorId::new("expert-a"),
                input_for(&head, 12),
                &head,
                &Deadline::none(),
            )
            .unwrap();
        store
            .submit(
                &ActorId::new("expert-b"),
                input_for(&head, 6),
                &head,
                &Deadline::none(),
            )
            .unwrap();

        assert_eq!(store.for_state(head.scenario_state_id).len(), 2);
    }

    #[test]
    fn test_curated_status_is_terminal() {
        let store = CaptureStore::new();
        let head = head_state();
        let expert = ActorId::new("expert-a");

        let rec = store
            .submit(&expert, input_for(&head, 12), &head, &Deadline::none())
            .unwrap();
        store
            .set_rubric_status(rec.expert_rec_id, RubricStatus::Curated)
            .unwrap();

        let err = store
            .set_rubric_status(rec.expert_rec_id, RubricStatus::Rejected)
            .unwrap_err();
        assert!(matches!(err, CaptureError::CuratedImmutable(_)));

        // Resubmission against a curated row is also rejected
        let err = store
            .submit(&expert, input_for(&head, 4), &head, &Deadline::none())
            .unwrap_err();
        assert!(matches!(err, CaptureError::CuratedImmutable(_)));
    }

    #[test]
    fn test_lapsed_deadline_fails_closed() {
        let store = CaptureStore::new();
        let head = head_state();
        let expert = ActorId::new("expert-a");

        let err = store
            .submit(
                &expert,
                input_for(&head, 12),
                &head,
                &Deadline::already_lapsed(),
            )
            .unwrap_err();
        assert!(matches!(err, CaptureError::DeadlineLapsed(_)));
        assert_eq!(store.row_count(head.episode_id, &expert, head.t_index), 0);
    }

    #[test]
    fn test_list_raw_filters_by_status() {
        let store = CaptureStore::new();
        let head = head_state();

        let rec = store
            .submit(
                &ActorId::new("expert-a"),
                input_for(&head, 12),
                &head,
                &Deadline::none(),
            )
            .unwrap();
        store
            .submit(
                &ActorId::new("expert-b"),
                input_for(&head, 6),
                &head,
                &Deadline::none(),
            )
            .unwrap();
        store
            .set_rubric_status(rec.expert_rec_id, RubricStatus::NeedsReview)
            .unwrap();

        assert_eq!(store.list_raw(10, None).len(), 2);
        assert_eq!(
            store.list_raw(10, Some(RubricStatus::NeedsReview)).len(),
            1
        );
        assert_eq!(store.list_raw(1, None).len(), 1);
    }
}

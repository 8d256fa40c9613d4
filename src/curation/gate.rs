//! Curation gate — rubric-scored promotion into the case library
//!
//! Per CURATION.md:
//! - G1: promotion is one-way; a curated case is never un-curated
//! - G2: promotion is idempotent; promoting an already-curated case is a
//!   no-op returning the existing case
//! - G3: rejection never deletes the raw recommendation; it stays
//!   inspectable for future re-review and is never auto-retried
//! - G4: promotion happens if and only if the weighted rubric total clears
//!   the version's threshold

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use super::case::LibraryCase;
use super::errors::{CurationError, CurationResult};
use super::rubric::{RubricScores, RubricVersion};
use crate::capture::{CaptureStore, RubricStatus};
use crate::core::{ActorId, Deadline};

/// Outcome of a promotion attempt. A below-threshold score is a NORMAL
/// outcome, not an error (G4).
#[derive(Debug, Clone, PartialEq)]
pub struct PromotionOutcome {
    /// Present when the case is (or already was) curated
    pub case_id: Option<Uuid>,
    pub is_curated: bool,
    pub rubric_total: f64,
    pub threshold: f64,
    pub rubric_version: String,
}

/// Curation configuration: available rubric versions.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CurationConfig {
    #[serde(default = "default_versions")]
    pub versions: Vec<RubricVersion>,
    #[serde(default = "default_version_id")]
    pub default_version: String,
}

fn default_versions() -> Vec<RubricVersion> {
    vec![RubricVersion::v1()]
}

fn default_version_id() -> String {
    "v1".to_string()
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self {
            versions: vec![RubricVersion::v1()],
            default_version: "v1".to_string(),
        }
    }
}

/// The curation gate and the case library it feeds.
pub struct CurationGate {
    config: CurationConfig,
    inner: Mutex<LibraryInner>,
}

struct LibraryInner {
    cases: HashMap<Uuid, LibraryCase>,
    /// expert_rec_id → case_id, for idempotent re-promotion
    by_rec: HashMap<Uuid, Uuid>,
}

impl CurationGate {
    pub fn new(config: CurationConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(LibraryInner {
                cases: HashMap::new(),
                by_rec: HashMap::new(),
            }),
        }
    }

    /// Promote a raw recommendation if its rubric score clears threshold.
    ///
    /// Idempotent under concurrent retries (G2): the rec→case index is
    /// checked under the library lock, so a second promotion of the same
    /// rec returns the existing case.
    pub fn promote_case_to_curated(
        &self,
        actor: &ActorId,
        capture: &CaptureStore,
        expert_rec_id: Uuid,
        scores: RubricScores,
        rubric_version: Option<&str>,
        curation_notes: Option<String>,
        deadline: &Deadline,
    ) -> CurationResult<PromotionOutcome> {
        if deadline.lapsed() {
            return Err(CurationError::DeadlineLapsed("promote_case_to_curated"));
        }

        scores.validate()?;
        let rubric = self.resolve_version(rubric_version)?;
        let total = rubric.weighted_total(&scores);

        let rec = capture
            .get(expert_rec_id)
            .map_err(|_| CurationError::RecommendationNotFound(expert_rec_id))?;

        let mut inner = self.inner.lock().unwrap();

        // G2: already curated → return the existing case unchanged.
        if let Some(case_id) = inner.by_rec.get(&expert_rec_id) {
            let case = &inner.cases[case_id];
            return Ok(PromotionOutcome {
                case_id: Some(*case_id),
                is_curated: true,
                rubric_total: case.rubric_total,
                threshold: rubric.threshold,
                rubric_version: case.rubric_version.clone(),
            });
        }

        if total < rubric.threshold {
            // G3/G4: normal below-threshold outcome. The raw case is kept
            // and flagged for human re-review; never auto-retried.
            drop(inner);
            capture.set_rubric_status(expert_rec_id, RubricStatus::NeedsReview)?;
            return Ok(PromotionOutcome {
                case_id: None,
                is_curated: false,
                rubric_total: total,
                threshold: rubric.threshold,
                rubric_version: rubric.version.clone(),
            });
        }

        let case = LibraryCase {
            case_id: Uuid::new_v4(),
            expert_rec_id,
            action_id: rec.action_id.clone(),
            plan: rec.planned_workout.clone(),
            dose_features: rec.planned_dose_features.clone(),
            rationale_tags: rec.rationale_tags.clone(),
            predicted_outcomes: rec.predicted_outcomes.clone(),
            rubric_total: total,
            rubric_version: rubric.version.clone(),
            curation_notes,
            curated_by: actor.clone(),
            is_curated: true,
            curated_at: Utc::now(),
            superseded_by: None,
        };

        let case_id = case.case_id;
        inner.by_rec.insert(expert_rec_id, case_id);
        inner.cases.insert(case_id, case);
        drop(inner);

        capture.set_rubric_status(expert_rec_id, RubricStatus::Curated)?;

        Ok(PromotionOutcome {
            case_id: Some(case_id),
            is_curated: true,
            rubric_total: total,
            threshold: rubric.threshold,
            rubric_version: rubric.version,
        })
    }

    /// Mark an existing case as superseded by a newer one. The only
    /// sanctioned change to a case after creation (G1).
    pub fn supersede_case(&self, old_case_id: Uuid, new_case_id: Uuid) -> CurationResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.cases.contains_key(&new_case_id) {
            return Err(CurationError::RecommendationNotFound(new_case_id));
        }
        let old = inner
            .cases
            .get_mut(&old_case_id)
            .ok_or(CurationError::RecommendationNotFound(old_case_id))?;
        old.superseded_by = Some(new_case_id);
        Ok(())
    }

    /// Fetch a case by id.
    pub fn get_case(&self, case_id: Uuid) -> Option<LibraryCase> {
        self.inner.lock().unwrap().cases.get(&case_id).cloned()
    }

    /// Search the library: case-insensitive substring match over plan name
    /// and rationale tags.
    ///
    /// `curated_only` filters out superseded cases. Results are ordered
    /// newest first, deterministically.
    pub fn search_cases(&self, q: &str, curated_only: bool, limit: usize) -> Vec<LibraryCase> {
        let needle = q.to_lowercase();
        let inner = self.inner.lock().unwrap();
        let mut hits: Vec<LibraryCase> = inner
            .cases
            .values()
            .filter(|case| !curated_only || case.superseded_by.is_none())
            .filter(|case| {
                needle.is_empty()
                    || case.plan.name.to_lowercase().contains(&needle)
                    || case
                        .rationale_tags
                        .iter()
                        .any(|tag| tag.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();
        hits.sort_by(|a, b| {
            b.curated_at
                .cmp(&a.curated_at)
                .then(b.case_id.cmp(&a.case_id))
        });
        hits.truncate(limit);
        hits
    }

    fn resolve_version(&self, requested: Option<&str>) -> CurationResult<RubricVersion> {
        let wanted = requested.unwrap_or(&self.config.default_version);
        self.config
            .versions
            .iter()
            .find(|v| v.version == wanted)
            .cloned()
            .ok_or_else(|| CurationError::UnknownRubricVersion(wanted.to_string()))
    }
}

impl Default for CurationGate {
    fn default() -> Self {
        Self::new(CurationConfig::default())
    }
}

//! Rule evaluation engine
//!
//! Per RULES.md:
//! - R5: `evaluate` is a PURE function of `(session_state, snapshot,
//!   config)` — no clocks, no hidden state, byte-identical output for
//!   identical input, fully replayable for auditing why a recommendation
//!   fired
//! - R6: safety-category messages surface as warnings; every other
//!   category surfaces as suggestions, regardless of declaration order
//! - R7: no matching rules is not an error; the engine returns the
//!   configured baseline
//!
//! Matching rules apply in descending priority, ties broken by creation
//! time (earliest wins), then id, so ordering is total.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use super::repository::RuleSnapshot;
use super::rule::{RuleAction, RuleCategory, RuleConfidence};
use super::session::SessionState;

/// Evaluation configuration: baseline output and confidence damping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Predicted quality when no rules match (R7)
    #[serde(default = "default_baseline_quality")]
    pub baseline_quality: f64,
    /// Output confidence when no rules match
    #[serde(default = "default_baseline_confidence")]
    pub baseline_confidence: f64,
    /// Quality-delta multipliers per rule confidence tier
    #[serde(default = "default_confidence_weights")]
    pub confidence_weights: ConfidenceWeights,
}

/// Per-tier damping of a rule's quality-delta contribution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConfidenceWeights {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
    pub experimental: f64,
}

impl ConfidenceWeights {
    /// Weight for a confidence tier.
    pub fn weight(&self, confidence: RuleConfidence) -> f64 {
        match confidence {
            RuleConfidence::High => self.high,
            RuleConfidence::Medium => self.medium,
            RuleConfidence::Low => self.low,
            RuleConfidence::Experimental => self.experimental,
        }
    }
}

fn default_baseline_quality() -> f64 {
    0.6
}

fn default_baseline_confidence() -> f64 {
    0.5
}

fn default_confidence_weights() -> ConfidenceWeights {
    ConfidenceWeights {
        high: 1.0,
        medium: 0.75,
        low: 0.5,
        experimental: 0.25,
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            baseline_quality: default_baseline_quality(),
            baseline_confidence: default_baseline_confidence(),
            confidence_weights: default_confidence_weights(),
        }
    }
}

/// The engine's output for one pre-session state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub predicted_quality: f64,
    pub confidence: f64,
    /// Session-state fields that drove the matched rules, sorted
    pub key_factors: Vec<String>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
    pub avoid: Vec<String>,
    pub include: Vec<String>,
    /// Ids of the rules that fired, in application order
    pub matched_rules: Vec<Uuid>,
}

/// Evaluate a session state against a rule snapshot.
pub fn evaluate(
    state: &SessionState,
    snapshot: &RuleSnapshot,
    config: &EvaluationConfig,
) -> RecommendationResponse {
    // Effective-rule filtering happened at snapshot time; re-assert expiry
    // against the snapshot's own as-of instant so the function stays pure.
    let mut matched: Vec<_> = snapshot
        .rules()
        .iter()
        .filter(|rule| rule.is_effective(snapshot.as_of))
        .filter(|rule| rule.matches(state))
        .collect();

    if matched.is_empty() {
        return RecommendationResponse {
            predicted_quality: config.baseline_quality,
            confidence: config.baseline_confidence,
            key_factors: Vec::new(),
            warnings: Vec::new(),
            suggestions: Vec::new(),
            avoid: Vec::new(),
            include: Vec::new(),
            matched_rules: Vec::new(),
        };
    }

    // Total application order: priority desc, created_at asc, id asc
    matched.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then(a.created_at.cmp(&b.created_at))
            .then(a.id.cmp(&b.id))
    });

    let mut quality = config.baseline_quality;
    let mut warnings = Vec::new();
    let mut suggestions = Vec::new();
    let mut avoid = BTreeSet::new();
    let mut include = BTreeSet::new();
    let mut key_factors = BTreeSet::new();
    let mut matched_rules = Vec::with_capacity(matched.len());
    let mut weight_sum = 0.0;

    for rule in &matched {
        let weight = config.confidence_weights.weight(rule.confidence);
        weight_sum += weight;
        matched_rules.push(rule.id);
        for field in &rule.condition_fields {
            key_factors.insert(field.clone());
        }

        for action in &rule.actions {
            match action {
                RuleAction::Message { text } => {
                    if rule.category == RuleCategory::Safety {
                        warnings.push(text.clone());
                    } else {
                        suggestions.push(text.clone());
                    }
                }
                RuleAction::AdjustQuality { delta } => {
                    quality += delta * weight;
                }
                RuleAction::Include { tag } => {
                    include.insert(tag.clone());
                }
                RuleAction::Avoid { tag } => {
                    avoid.insert(tag.clone());
                }
            }
        }
    }

    let confidence = (weight_sum / matched.len() as f64).clamp(0.0, 1.0);

    RecommendationResponse {
        predicted_quality: quality.clamp(0.0, 1.0),
        confidence,
        key_factors: key_factors.into_iter().collect(),
        warnings,
        suggestions,
        avoid: avoid.into_iter().collect(),
        include: include.into_iter().collect(),
        matched_rules,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ActorId, Deadline};
    use crate::rules::audit::MemoryAuditLog;
    use crate::rules::repository::{NewRule, RuleRepository};
    use crate::rules::rule::{ConditionOp, RuleCondition};
    use crate::rules::session::FieldValue;
    use chrono::Utc;
    use std::sync::Arc;

    fn repo() -> RuleRepository {
        RuleRepository::new(Arc::new(MemoryAuditLog::new()))
    }

    fn pain_condition() -> RuleCondition {
        RuleCondition {
            field: "has_pain".into(),
            op: ConditionOp::Eq,
            value: FieldValue::Bool(true),
        }
    }

    fn rule_input(
        name: &str,
        category: RuleCategory,
        priority: i32,
        confidence: RuleConfidence,
        actions: Vec<RuleAction>,
    ) -> NewRule {
        NewRule {
            name: name.to_string(),
            conditions: vec![pain_condition()],
            actions,
            category,
            priority,
            confidence,
            source: "manual".into(),
            evidence: None,
            source_scenario_id: None,
            review_session_id: None,
            expires_at: None,
            active: true,
        }
    }

    fn pain_state() -> SessionState {
        SessionState {
            has_pain: true,
            ..SessionState::default()
        }
    }

    #[test]
    fn test_no_match_returns_baseline() {
        let repo = repo();
        let config = EvaluationConfig::default();
        let response = evaluate(
            &SessionState::default(),
            &repo.snapshot(Utc::now()),
            &config,
        );

        assert_eq!(response.predicted_quality, config.baseline_quality);
        assert!(response.warnings.is_empty());
        assert!(response.matched_rules.is_empty());
    }

    #[test]
    fn test_safety_routes_to_warnings_others_to_suggestions() {
        let repo = repo();
        let admin = ActorId::new("admin");

        // Same priority; declaration order must not matter (R6)
        repo.create_rule(
            &admin,
            rule_input(
                "perf rule",
                RuleCategory::Performance,
                5,
                RuleConfidence::High,
                vec![RuleAction::Message {
                    text: "add a board session".into(),
                }],
            ),
            &Deadline::none(),
        )
        .unwrap();
        repo.create_rule(
            &admin,
            rule_input(
                "pain rule",
                RuleCategory::Safety,
                5,
                RuleConfidence::High,
                vec![RuleAction::Message {
                    text: "avoid crimping until pain-free".into(),
                }],
            ),
            &Deadline::none(),
        )
        .unwrap();

        let response = evaluate(
            &pain_state(),
            &repo.snapshot(Utc::now()),
            &EvaluationConfig::default(),
        );

        assert_eq!(response.warnings, vec!["avoid crimping until pain-free"]);
        assert_eq!(response.suggestions, vec!["add a board session"]);
    }

    #[test]
    fn test_priority_orders_application() {
        let repo = repo();
        let admin = ActorId::new("admin");

        let low = repo
            .create_rule(
                &admin,
                rule_input(
                    "low",
                    RuleCategory::Conservative,
                    1,
                    RuleConfidence::High,
                    vec![RuleAction::Message { text: "low".into() }],
                ),
                &Deadline::none(),
            )
            .unwrap();
        let high = repo
            .create_rule(
                &admin,
                rule_input(
                    "high",
                    RuleCategory::Conservative,
                    9,
                    RuleConfidence::High,
                    vec![RuleAction::Message { text: "high".into() }],
                ),
                &Deadline::none(),
            )
            .unwrap();

        let response = evaluate(
            &pain_state(),
            &repo.snapshot(Utc::now()),
            &EvaluationConfig::default(),
        );
        assert_eq!(response.matched_rules, vec![high.id, low.id]);
        assert_eq!(response.suggestions, vec!["high", "low"]);
    }

    #[test]
    fn test_confidence_damps_quality_delta() {
        let config = EvaluationConfig::default();

        let repo_high = repo();
        repo_high
            .create_rule(
                &ActorId::new("admin"),
                rule_input(
                    "high conf",
                    RuleCategory::Safety,
                    5,
                    RuleConfidence::High,
                    vec![RuleAction::AdjustQuality { delta: -0.2 }],
                ),
                &Deadline::none(),
            )
            .unwrap();

        let repo_exp = repo();
        repo_exp
            .create_rule(
                &ActorId::new("admin"),
                rule_input(
                    "experimental conf",
                    RuleCategory::Safety,
                    5,
                    RuleConfidence::Experimental,
                    vec![RuleAction::AdjustQuality { delta: -0.2 }],
                ),
                &Deadline::none(),
            )
            .unwrap();

        let high = evaluate(&pain_state(), &repo_high.snapshot(Utc::now()), &config);
        let experimental = evaluate(&pain_state(), &repo_exp.snapshot(Utc::now()), &config);

        // Full-weight delta: 0.6 - 0.2; experimental: 0.6 - 0.05
        assert!(high.predicted_quality < experimental.predicted_quality);
        assert!((high.predicted_quality - 0.4).abs() < 1e-9);
        assert!((experimental.predicted_quality - 0.55).abs() < 1e-9);
    }

    #[test]
    fn test_include_avoid_sets() {
        let repo = repo();
        repo.create_rule(
            &ActorId::new("admin"),
            rule_input(
                "pain plan shape",
                RuleCategory::Safety,
                5,
                RuleConfidence::High,
                vec![
                    RuleAction::Avoid { tag: "crimps".into() },
                    RuleAction::Avoid { tag: "campus".into() },
                    RuleAction::Include { tag: "open-hand".into() },
                ],
            ),
            &Deadline::none(),
        )
        .unwrap();

        let response = evaluate(
            &pain_state(),
            &repo.snapshot(Utc::now()),
            &EvaluationConfig::default(),
        );
        assert_eq!(response.avoid, vec!["campus", "crimps"]);
        assert_eq!(response.include, vec!["open-hand"]);
        assert_eq!(response.key_factors, vec!["has_pain"]);
    }

    #[test]
    fn test_evaluation_deterministic() {
        let repo = repo();
        let admin = ActorId::new("admin");
        for i in 0..5 {
            repo.create_rule(
                &admin,
                rule_input(
                    &format!("rule {}", i),
                    if i % 2 == 0 {
                        RuleCategory::Safety
                    } else {
                        RuleCategory::Performance
                    },
                    i,
                    RuleConfidence::Medium,
                    vec![
                        RuleAction::Message {
                            text: format!("msg {}", i),
                        },
                        RuleAction::AdjustQuality { delta: -0.01 * i as f64 },
                    ],
                ),
                &Deadline::none(),
            )
            .unwrap();
        }

        let snapshot = repo.snapshot(Utc::now());
        let config = EvaluationConfig::default();
        let state = pain_state();

        let a = evaluate(&state, &snapshot, &config);
        let b = evaluate(&state, &snapshot, &config);
        assert_eq!(a, b, "R5 VIOLATION: evaluation not deterministic");

        let json_a = serde_json::to_string(&a).unwrap();
        let json_b = serde_json::to_string(&b).unwrap();
        assert_eq!(json_a, json_b, "R5 VIOLATION: output not byte-identical");
    }
}

//! Rule Evaluation Invariant Tests
//!
//! Tests for invariants:
//! - R5: identical session state + identical rule set → byte-identical
//!   output, regardless of call order
//! - R6: safety-category messages surface as warnings, others as
//!   suggestions, regardless of declaration order at equal priority
//! - R7: no matching rules yields the baseline, never an error
//! - Snapshot isolation: concurrent rule edits never change an in-flight
//!   evaluation's input

use std::sync::Arc;

use betalab::core::{ActorId, Deadline};
use betalab::rules::{
    evaluate, ConditionOp, EvaluationConfig, FieldValue, MemoryAuditLog, NewRule, RuleAction,
    RuleCategory, RuleCondition, RuleConfidence, RuleRepository, SessionState,
};
use chrono::Utc;

// =============================================================================
// Test Utilities
// =============================================================================

fn admin() -> ActorId {
    ActorId::new("admin")
}

fn repo() -> RuleRepository {
    RuleRepository::new(Arc::new(MemoryAuditLog::new()))
}

fn rule(
    name: &str,
    category: RuleCategory,
    priority: i32,
    actions: Vec<RuleAction>,
) -> NewRule {
    NewRule {
        name: name.to_string(),
        conditions: vec![RuleCondition {
            field: "has_pain".into(),
            op: ConditionOp::Eq,
            value: FieldValue::Bool(true),
        }],
        actions,
        category,
        priority,
        confidence: RuleConfidence::High,
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
        readiness: 0.4,
        ..SessionState::default()
    }
}

// =============================================================================
// INVARIANT R6: Category Routing
// =============================================================================

/// The canonical example: a safety rule on `has_pain == true` and a
/// performance rule both match at equal priority; the safety message lands
/// in warnings, the performance message in suggestions — in either
/// declaration order.
#[test]
fn test_r6_safety_to_warnings_at_equal_priority() {
    for safety_first in [true, false] {
        let repo = repo();
        let declare = |category, text: &str| {
            rule(
                text,
                category,
                5,
                vec![RuleAction::Message { text: text.into() }],
            )
        };

        if safety_first {
            repo.create_rule(&admin(), declare(RuleCategory::Safety, "warn"), &Deadline::none())
                .unwrap();
            repo.create_rule(
                &admin(),
                declare(RuleCategory::Performance, "suggest"),
                &Deadline::none(),
            )
            .unwrap();
        } else {
            repo.create_rule(
                &admin(),
                declare(RuleCategory::Performance, "suggest"),
                &Deadline::none(),
            )
            .unwrap();
            repo.create_rule(&admin(), declare(RuleCategory::Safety, "warn"), &Deadline::none())
                .unwrap();
        }

        let response = evaluate(
            &pain_state(),
            &repo.snapshot(Utc::now()),
            &EvaluationConfig::default(),
        );

        assert_eq!(
            response.warnings,
            vec!["warn"],
            "R6 VIOLATION (safety_first={})",
            safety_first
        );
        assert_eq!(response.suggestions, vec!["suggest"]);
    }
}

/// Every non-safety category routes to suggestions.
#[test]
fn test_r6_all_other_categories_suggest() {
    for category in [
        RuleCategory::Interaction,
        RuleCategory::EdgeCase,
        RuleCategory::Conservative,
        RuleCategory::Performance,
    ] {
        let repo = repo();
        repo.create_rule(
            &admin(),
            rule(
                "r",
                category,
                5,
                vec![RuleAction::Message { text: "note".into() }],
            ),
            &Deadline::none(),
        )
        .unwrap();

        let response = evaluate(
            &pain_state(),
            &repo.snapshot(Utc::now()),
            &EvaluationConfig::default(),
        );
        assert!(response.warnings.is_empty(), "{:?} must not warn", category);
        assert_eq!(response.suggestions, vec!["note"]);
    }
}

// =============================================================================
// INVARIANT R5: Determinism
// =============================================================================

#[test]
fn test_r5_byte_identical_output() {
    let repo = repo();
    for i in 0..6 {
        repo.create_rule(
            &admin(),
            rule(
                &format!("rule-{}", i),
                if i % 2 == 0 {
                    RuleCategory::Safety
                } else {
                    RuleCategory::Conservative
                },
                i,
                vec![
                    RuleAction::Message {
                        text: format!("message {}", i),
                    },
                    RuleAction::AdjustQuality {
                        delta: -0.02 * i as f64,
                    },
                    RuleAction::Avoid {
                        tag: format!("tag-{}", i),
                    },
                ],
            ),
            &Deadline::none(),
        )
        .unwrap();
    }

    let snapshot = repo.snapshot(Utc::now());
    let config = EvaluationConfig::default();
    let state = pain_state();

    let outputs: Vec<String> = (0..5)
        .map(|_| serde_json::to_string(&evaluate(&state, &snapshot, &config)).unwrap())
        .collect();
    assert!(
        outputs.windows(2).all(|w| w[0] == w[1]),
        "R5 VIOLATION: outputs differ across calls"
    );
}

/// Priority ordering with created-at tie-break is total: two rules at the
/// same priority apply in creation order.
#[test]
fn test_r5_tie_break_by_creation_time() {
    let repo = repo();
    let first = repo
        .create_rule(
            &admin(),
            rule(
                "first",
                RuleCategory::Conservative,
                5,
                vec![RuleAction::Message { text: "first".into() }],
            ),
            &Deadline::none(),
        )
        .unwrap();
    // Distinct creation timestamps for the tie-break
    std::thread::sleep(std::time::Duration::from_millis(5));
    let second = repo
        .create_rule(
            &admin(),
            rule(
                "second",
                RuleCategory::Conservative,
                5,
                vec![RuleAction::Message { text: "second".into() }],
            ),
            &Deadline::none(),
        )
        .unwrap();

    let response = evaluate(
        &pain_state(),
        &repo.snapshot(Utc::now()),
        &EvaluationConfig::default(),
    );
    assert_eq!(response.matched_rules, vec![first.id, second.id]);
    assert_eq!(response.suggestions, vec!["first", "second"]);
}

// =============================================================================
// INVARIANT R7: Baseline Result
// =============================================================================

#[test]
fn test_r7_no_rules_is_baseline_not_error() {
    let repo = repo();
    let config = EvaluationConfig::default();
    let response = evaluate(&SessionState::default(), &repo.snapshot(Utc::now()), &config);

    assert_eq!(response.predicted_quality, config.baseline_quality);
    assert_eq!(response.confidence, config.baseline_confidence);
    assert!(response.warnings.is_empty());
    assert!(response.suggestions.is_empty());
    assert!(response.key_factors.is_empty());
}

#[test]
fn test_r7_no_match_is_baseline() {
    let repo = repo();
    repo.create_rule(
        &admin(),
        rule(
            "pain gate",
            RuleCategory::Safety,
            5,
            vec![RuleAction::Message { text: "warn".into() }],
        ),
        &Deadline::none(),
    )
    .unwrap();

    // State without pain: the rule does not match
    let response = evaluate(
        &SessionState::default(),
        &repo.snapshot(Utc::now()),
        &EvaluationConfig::default(),
    );
    assert!(response.matched_rules.is_empty());
    assert_eq!(
        response.predicted_quality,
        EvaluationConfig::default().baseline_quality
    );
}

// =============================================================================
// Snapshot Isolation
// =============================================================================

/// A snapshot taken before a rule edit keeps evaluating the old rule set.
#[test]
fn test_snapshot_isolated_from_concurrent_edits() {
    let repo = repo();
    let rule_v1 = repo
        .create_rule(
            &admin(),
            rule(
                "pain gate",
                RuleCategory::Safety,
                5,
                vec![RuleAction::Message { text: "v1 warning".into() }],
            ),
            &Deadline::none(),
        )
        .unwrap();

    let snapshot = repo.snapshot(Utc::now());

    // Concurrent edit: deactivate the rule after the snapshot was taken
    repo.toggle_rule_active(&admin(), rule_v1.id, false, &Deadline::none())
        .unwrap();

    let response = evaluate(&pain_state(), &snapshot, &EvaluationConfig::default());
    assert_eq!(
        response.warnings,
        vec!["v1 warning"],
        "snapshot must not observe the concurrent edit"
    );

    // A fresh snapshot does observe it
    let fresh = evaluate(
        &pain_state(),
        &repo.snapshot(Utc::now()),
        &EvaluationConfig::default(),
    );
    assert!(fresh.warnings.is_empty());
}

// =============================================================================
// Confidence Damping
// =============================================================================

#[test]
fn test_experimental_rules_contribute_less() {
    let config = EvaluationConfig::default();

    let build = |confidence| {
        let repo = repo();
        let mut input = rule(
            "delta",
            RuleCategory::Conservative,
            5,
            vec![RuleAction::AdjustQuality { delta: -0.2 }],
        );
        input.confidence = confidence;
        repo.create_rule(&admin(), input, &Deadline::none()).unwrap();
        evaluate(&pain_state(), &repo.snapshot(Utc::now()), &config).predicted_quality
    };

    let high = build(RuleConfidence::High);
    let medium = build(RuleConfidence::Medium);
    let low = build(RuleConfidence::Low);
    let experimental = build(RuleConfidence::Experimental);

    assert!(high < medium);
    assert!(medium < low);
    assert!(low < experimental);
}

//! Rule model — versioned condition→action units
//!
//! Per RULES.md §1:
//! - Lifecycle: created → (modified | activated | deactivated)* →
//!   superseded (terminal) or expired
//! - `condition_fields` is derived from the conditions at write time so
//!   the evaluator never re-parses condition expressions to learn which
//!   session fields a rule reads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::session::{FieldValue, SessionState};

/// Rule category. Safety actions always surface as warnings (R6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    Safety,
    Interaction,
    EdgeCase,
    Conservative,
    Performance,
}

impl RuleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleCategory::Safety => "safety",
            RuleCategory::Interaction => "interaction",
            RuleCategory::EdgeCase => "edge_case",
            RuleCategory::Conservative => "conservative",
            RuleCategory::Performance => "performance",
        }
    }
}

/// Rule confidence tier. Dampens the rule's quality-delta contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleConfidence {
    High,
    Medium,
    Low,
    Experimental,
}

impl RuleConfidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleConfidence::High => "high",
            RuleConfidence::Medium => "medium",
            RuleConfidence::Low => "low",
            RuleConfidence::Experimental => "experimental",
        }
    }
}

/// Comparison operator in a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// One condition over a named session-state field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleCondition {
    pub field: String,
    pub op: ConditionOp,
    pub value: FieldValue,
}

impl RuleCondition {
    /// Evaluate this condition against a session state.
    ///
    /// A missing field or a type mismatch is simply a non-match — the
    /// evaluator never throws over rule/state shape drift (R7).
    pub fn matches(&self, state: &SessionState) -> bool {
        let Some(actual) = state.field(&self.field) else {
            return false;
        };
        match (&actual, &self.value) {
            (FieldValue::Bool(a), FieldValue::Bool(b)) => match self.op {
                ConditionOp::Eq => a == b,
                ConditionOp::Ne => a != b,
                _ => false,
            },
            (FieldValue::Number(a), FieldValue::Number(b)) => match self.op {
                ConditionOp::Eq => a == b,
                ConditionOp::Ne => a != b,
                ConditionOp::Gt => a > b,
                ConditionOp::Gte => a >= b,
                ConditionOp::Lt => a < b,
                ConditionOp::Lte => a <= b,
            },
            (FieldValue::Text(a), FieldValue::Text(b)) => match self.op {
                ConditionOp::Eq => a == b,
                ConditionOp::Ne => a != b,
                _ => false,
            },
            _ => false,
        }
    }
}

/// One action a matched rule applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleAction {
    /// A message; routed to `warnings` for safety rules, `suggestions`
    /// otherwise (R6)
    Message { text: String },
    /// Shift predicted quality, dampened by the rule's confidence tier
    AdjustQuality { delta: f64 },
    /// Recommend including a tagged element
    Include { tag: String },
    /// Recommend avoiding a tagged element
    Avoid { tag: String },
}

/// A versioned rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: Uuid,
    pub name: String,
    pub conditions: Vec<RuleCondition>,
    pub actions: Vec<RuleAction>,
    /// Derived: sorted, deduplicated fields the conditions read
    pub condition_fields: Vec<String>,
    pub category: RuleCategory,
    pub priority: i32,
    pub confidence: RuleConfidence,
    pub is_active: bool,

    /// Where this rule came from (e.g., "consensus", "manual")
    pub source: String,
    pub evidence: Option<String>,
    pub source_scenario_id: Option<Uuid>,
    pub review_session_id: Option<Uuid>,

    pub expires_at: Option<DateTime<Utc>>,
    pub superseded_by: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Rule {
    /// Whether the rule is expired as of `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(false, |at| at <= now)
    }

    /// Whether the evaluator may apply this rule as of `now`.
    ///
    /// Per RULES.md §R4: an expired, still-active rule is treated as
    /// inactive even before housekeeping flips its flag.
    pub fn is_effective(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.superseded_by.is_none() && !self.is_expired(now)
    }

    /// Whether all conditions match the session state.
    pub fn matches(&self, state: &SessionState) -> bool {
        self.conditions.iter().all(|c| c.matches(state))
    }

    /// Derive the sorted, deduplicated condition-field list.
    pub fn derive_condition_fields(conditions: &[RuleCondition]) -> Vec<String> {
        let mut fields: Vec<String> = conditions.iter().map(|c| c.field.clone()).collect();
        fields.sort();
        fields.dedup();
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_pain() -> SessionState {
        SessionState {
            has_pain: true,
            readiness: 0.4,
            ..SessionState::default()
        }
    }

    #[test]
    fn test_bool_condition() {
        let condition = RuleCondition {
            field: "has_pain".into(),
            op: ConditionOp::Eq,
            value: FieldValue::Bool(true),
        };
        assert!(condition.matches(&state_with_pain()));
        assert!(!condition.matches(&SessionState::default()));
    }

    #[test]
    fn test_number_comparisons() {
        let state = state_with_pain(); // readiness 0.4
        let lt = RuleCondition {
            field: "readiness".into(),
            op: ConditionOp::Lt,
            value: FieldValue::Number(0.5),
        };
        let gte = RuleCondition {
            field: "readiness".into(),
            op: ConditionOp::Gte,
            value: FieldValue::Number(0.5),
        };
        assert!(lt.matches(&state));
        assert!(!gte.matches(&state));
    }

    #[test]
    fn test_missing_field_is_nonmatch() {
        let condition = RuleCondition {
            field: "nonexistent".into(),
            op: ConditionOp::Eq,
            value: FieldValue::Number(1.0),
        };
        assert!(!condition.matches(&SessionState::default()));
    }

    #[test]
    fn test_type_mismatch_is_nonmatch() {
        let condition = RuleCondition {
            field: "has_pain".into(),
            op: ConditionOp::Gt,
            value: FieldValue::Number(0.0),
        };
        assert!(!condition.matches(&state_with_pain()));
    }

    #[test]
    fn test_derive_condition_fields_sorted_dedup() {
        let conditions = vec![
            RuleCondition {
                field: "readiness".into(),
                op: ConditionOp::Lt,
                value: FieldValue::Number(0.5),
            },
            RuleCondition {
                field: "has_pain".into(),
                op: ConditionOp::Eq,
                value: FieldValue::Bool(true),
            },
            RuleCondition {
                field: "readiness".into(),
                op: ConditionOp::Gt,
                value: FieldValue::Number(0.1),
            },
        ];
        assert_eq!(
            Rule::derive_condition_fields(&conditions),
            vec!["has_pain".to_string(), "readiness".to_string()]
        );
    }
}

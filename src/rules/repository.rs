//! Rule repository — the only mutation entry points for rules
//!
//! Per RULES.md:
//! - R1: every state-changing operation produces exactly one audit entry
//! - R2: mutation + audit append are atomic. The entry is appended FIRST,
//!   under the repository lock; only if the append succeeds is the state
//!   change applied (the apply step is an infallible map write). An append
//!   failure leaves the repository untouched
//! - R3: `supersede` is the only sanctioned way to change an active rule's
//!   conditions/actions; superseded is terminal
//! - R4: `sweep_expired` is housekeeping only — the evaluator already
//!   treats expired rules as inactive via snapshots
//! - Evaluation reads immutable snapshots, so concurrent rule edits never
//!   affect an in-flight evaluation

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::audit::{RuleAuditAction, RuleAuditEntry, RuleAuditLog};
use super::errors::{RuleError, RuleResult};
use super::rule::{Rule, RuleAction, RuleCategory, RuleCondition, RuleConfidence};
use crate::core::{ActorId, Deadline};

/// Input to `create_rule`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRule {
    pub name: String,
    pub conditions: Vec<RuleCondition>,
    pub actions: Vec<RuleAction>,
    pub category: RuleCategory,
    #[serde(default)]
    pub priority: i32,
    pub confidence: RuleConfidence,
    pub source: String,
    #[serde(default)]
    pub evidence: Option<String>,
    #[serde(default)]
    pub source_scenario_id: Option<Uuid>,
    #[serde(default)]
    pub review_session_id: Option<Uuid>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Rules activate on creation unless explicitly drafted
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Input to `update_rule`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub confidence: Option<RuleConfidence>,
    #[serde(default)]
    pub evidence: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Logic changes; rejected while the rule is active (R3)
    #[serde(default)]
    pub conditions: Option<Vec<RuleCondition>>,
    #[serde(default)]
    pub actions: Option<Vec<RuleAction>>,
}

impl RuleUpdate {
    fn touches_logic(&self) -> bool {
        self.conditions.is_some() || self.actions.is_some()
    }
}

/// An immutable view of the effective rule set at a point in time.
///
/// Evaluation works only on snapshots; an in-flight evaluation can never
/// observe a concurrent rule edit.
#[derive(Debug, Clone)]
pub struct RuleSnapshot {
    pub as_of: DateTime<Utc>,
    rules: Vec<Rule>,
}

impl RuleSnapshot {
    /// Effective rules in this snapshot.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// The versioned rule store plus its audit log.
pub struct RuleRepository {
    inner: Mutex<HashMap<Uuid, Rule>>,
    audit: Arc<dyn RuleAuditLog>,
}

impl RuleRepository {
    pub fn new(audit: Arc<dyn RuleAuditLog>) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            audit,
        }
    }

    /// Create a rule. Atomic with its Created audit entry (R1, R2).
    pub fn create_rule(
        &self,
        actor: &ActorId,
        input: NewRule,
        deadline: &Deadline,
    ) -> RuleResult<Rule> {
        if deadline.lapsed() {
            return Err(RuleError::deadline_lapsed("create_rule"));
        }
        if input.name.trim().is_empty() {
            return Err(RuleError::invalid("rule name must not be empty"));
        }
        if input.conditions.is_empty() {
            return Err(RuleError::invalid("rule must have at least one condition"));
        }
        if input.actions.is_empty() {
            return Err(RuleError::invalid("rule must have at least one action"));
        }

        let now = Utc::now();
        let condition_fields = Rule::derive_condition_fields(&input.conditions);
        let rule = Rule {
            id: Uuid::new_v4(),
            name: input.name,
            conditions: input.conditions,
            actions: input.actions,
            condition_fields,
            category: input.category,
            priority: input.priority,
            confidence: input.confidence,
            is_active: input.active,
            source: input.source,
            evidence: input.evidence,
            source_scenario_id: input.source_scenario_id,
            review_session_id: input.review_session_id,
            expires_at: input.expires_at,
            superseded_by: None,
            created_at: now,
            updated_at: now,
        };

        let mut rules = self.inner.lock().unwrap();
        self.append_audit(RuleAuditAction::Created, actor, None, &rule)?;
        rules.insert(rule.id, rule.clone());
        Ok(rule)
    }

    /// Update rule metadata; logic edits are rejected while active (R3).
    pub fn update_rule(
        &self,
        actor: &ActorId,
        rule_id: Uuid,
        update: RuleUpdate,
        deadline: &Deadline,
    ) -> RuleResult<Rule> {
        if deadline.lapsed() {
            return Err(RuleError::deadline_lapsed("update_rule"));
        }

        let mut rules = self.inner.lock().unwrap();
        let current = rules
            .get(&rule_id)
            .ok_or_else(|| RuleError::not_found(rule_id))?;

        if current.superseded_by.is_some() {
            return Err(RuleError::superseded_terminal(rule_id));
        }
        if current.is_active && update.touches_logic() {
            return Err(RuleError::active_logic_immutable(rule_id));
        }

        let previous = current.clone();
        let mut updated = previous.clone();
        if let Some(name) = update.name {
            updated.name = name;
        }
        if let Some(priority) = update.priority {
            updated.priority = priority;
        }
        if let Some(confidence) = update.confidence {
            updated.confidence = confidence;
        }
        if let Some(evidence) = update.evidence {
            updated.evidence = Some(evidence);
        }
        if let Some(expires_at) = update.expires_at {
            updated.expires_at = Some(expires_at);
        }
        if let Some(conditions) = update.conditions {
            updated.condition_fields = Rule::derive_condition_fields(&conditions);
            updated.conditions = conditions;
        }
        if let Some(actions) = update.actions {
            updated.actions = actions;
        }
        updated.updated_at = Utc::now();

        self.append_audit(RuleAuditAction::Modified, actor, Some(&previous), &updated)?;
        rules.insert(rule_id, updated.clone());
        Ok(updated)
    }

    /// Flip a rule's active flag. A no-op toggle (already in the requested
    /// state) is NOT a mutation and produces no audit entry.
    pub fn toggle_rule_active(
        &self,
        actor: &ActorId,
        rule_id: Uuid,
        active: bool,
        deadline: &Deadline,
    ) -> RuleResult<Rule> {
        if deadline.lapsed() {
            return Err(RuleError::deadline_lapsed("toggle_rule_active"));
        }

        let mut rules = self.inner.lock().unwrap();
        let current = rules
            .get(&rule_id)
            .ok_or_else(|| RuleError::not_found(rule_id))?;

        if current.superseded_by.is_some() {
            return Err(RuleError::superseded_terminal(rule_id));
        }
        if current.is_active == active {
            return Ok(current.clone());
        }

        let previous = current.clone();
        let mut updated = previous.clone();
        updated.is_active = active;
        updated.updated_at = Utc::now();

        let action = if active {
            RuleAuditAction::Activated
        } else {
            RuleAuditAction::Deactivated
        };
        self.append_audit(action, actor, Some(&previous), &updated)?;
        rules.insert(rule_id, updated.clone());
        Ok(updated)
    }

    /// Supersede `old_id` with `new_id`: deactivates the old rule and sets
    /// its `superseded_by` in one audited mutation. Terminal (R3).
    pub fn supersede(
        &self,
        actor: &ActorId,
        old_id: Uuid,
        new_id: Uuid,
        deadline: &Deadline,
    ) -> RuleResult<Rule> {
        if deadline.lapsed() {
            return Err(RuleError::deadline_lapsed("supersede"));
        }

        let mut rules = self.inner.lock().unwrap();
        if !rules.contains_key(&new_id) {
            return Err(RuleError::not_found(new_id));
        }
        let current = rules
            .get(&old_id)
            .ok_or_else(|| RuleError::not_found(old_id))?;
        if current.superseded_by.is_some() {
            return Err(RuleError::superseded_terminal(old_id));
        }

        let previous = current.clone();
        let mut updated = previous.clone();
        updated.is_active = false;
        updated.superseded_by = Some(new_id);
        updated.updated_at = Utc::now();

        self.append_audit(RuleAuditAction::Superseded, actor, Some(&previous), &updated)?;
        rules.insert(old_id, updated.clone());
        Ok(updated)
    }

    /// Housekeeping: flip `is_active` on expired rules, one audited
    /// deactivation each. Returns the flipped rule ids.
    pub fn sweep_expired(
        &self,
        actor: &ActorId,
        now: DateTime<Utc>,
        deadline: &Deadline,
    ) -> RuleResult<Vec<Uuid>> {
        if deadline.lapsed() {
            return Err(RuleError::deadline_lapsed("sweep_expired"));
        }

        let mut rules = self.inner.lock().unwrap();
        let expired: Vec<Uuid> = rules
            .values()
            .filter(|r| r.is_active && r.is_expired(now))
            .map(|r| r.id)
            .collect();

        let mut flipped = Vec::with_capacity(expired.len());
        for rule_id in expired {
            let previous = rules[&rule_id].clone();
            let mut updated = previous.clone();
            updated.is_active = false;
            updated.updated_at = now;
            self.append_audit(
                RuleAuditAction::Deactivated,
                actor,
                Some(&previous),
                &updated,
            )?;
            rules.insert(rule_id, updated);
            flipped.push(rule_id);
        }
        Ok(flipped)
    }

    /// Fetch a rule by id.
    pub fn get_rule(&self, rule_id: Uuid) -> RuleResult<Rule> {
        self.inner
            .lock()
            .unwrap()
            .get(&rule_id)
            .cloned()
            .ok_or_else(|| RuleError::not_found(rule_id))
    }

    /// All rules, ordered by creation time then id (deterministic).
    pub fn list_rules(&self) -> Vec<Rule> {
        let rules = self.inner.lock().unwrap();
        let mut all: Vec<Rule> = rules.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        all
    }

    /// An immutable snapshot of the rules effective as of `now` (R4, R5).
    pub fn snapshot(&self, now: DateTime<Utc>) -> RuleSnapshot {
        let rules = self.inner.lock().unwrap();
        let mut effective: Vec<Rule> = rules
            .values()
            .filter(|r| r.is_effective(now))
            .cloned()
            .collect();
        effective.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        RuleSnapshot {
            as_of: now,
            rules: effective,
        }
    }

    /// Read the audit log, optionally filtered to one rule.
    pub fn get_audit_log(&self, rule_id: Option<Uuid>) -> RuleResult<Vec<RuleAuditEntry>> {
        self.audit.entries(rule_id).map_err(|e| {
            RuleError::new(
                super::errors::RuleErrorKind::AuditWriteFailed,
                format!("audit read failed: {}", e),
            )
        })
    }

    /// Append an audit entry for a mutation about to be applied (R2).
    ///
    /// Called under the repository lock; the caller applies the state
    /// change only after this returns Ok.
    fn append_audit(
        &self,
        action: RuleAuditAction,
        actor: &ActorId,
        previous: Option<&Rule>,
        new: &Rule,
    ) -> RuleResult<()> {
        let entry = RuleAuditEntry::new(
            new.id,
            action,
            actor.clone(),
            previous
                .map(|r| serde_json::to_value(r).map_err(RuleError::audit_write_failed))
                .transpose()?,
            serde_json::to_value(new).map_err(RuleError::audit_write_failed)?,
        );
        self.audit
            .append(&entry)
            .map_err(RuleError::audit_write_failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::audit::{FailingAuditLog, MemoryAuditLog};
    use crate::rules::rule::ConditionOp;
    use crate::rules::session::FieldValue;

    fn new_rule(name: &str) -> NewRule {
        NewRule {
            name: name.to_string(),
            conditions: vec![RuleCondition {
                field: "has_pain".into(),
                op: ConditionOp::Eq,
                value: FieldValue::Bool(true),
            }],
            actions: vec![RuleAction::Message {
                text: "back off finger-intensive work".into(),
            }],
            category: RuleCategory::Safety,
            priority: 10,
            confidence: RuleConfidence::High,
            source: "manual".into(),
            evidence: None,
            source_scenario_id: None,
            review_session_id: None,
            expires_at: None,
            active: true,
        }
    }

    fn repo() -> RuleRepository {
        RuleRepository::new(Arc::new(MemoryAuditLog::new()))
    }

    fn admin() -> ActorId {
        ActorId::new("admin")
    }

    #[test]
    fn test_create_rule_audited() {
        let repo = repo();
        let rule = repo
            .create_rule(&admin(), new_rule("pain gate"), &Deadline::none())
            .unwrap();

        let log = repo.get_audit_log(Some(rule.id)).unwrap();
        assert_eq!(log.len(), 1, "R1 VIOLATION: create produced != 1 entry");
        assert_eq!(log[0].action, RuleAuditAction::Created);
        assert!(log[0].previous.is_none());
    }

    #[test]
    fn test_every_mutation_exactly_one_entry() {
        let repo = repo();
        let rule = repo
            .create_rule(&admin(), new_rule("pain gate"), &Deadline::none())
            .unwrap();

        repo.toggle_rule_active(&admin(), rule.id, false, &Deadline::none())
            .unwrap();
        repo.update_rule(
            &admin(),
            rule.id,
            RuleUpdate {
                priority: Some(20),
                ..Default::default()
            },
            &Deadline::none(),
        )
        .unwrap();
        repo.toggle_rule_active(&admin(), rule.id, true, &Deadline::none())
            .unwrap();

        // 4 state-changing operations → exactly 4 entries
        let log = repo.get_audit_log(Some(rule.id)).unwrap();
        assert_eq!(log.len(), 4, "R1 VIOLATION: entries != mutations");
        // Each entry's snapshots are distinct
        for entry in &log {
            assert_ne!(entry.previous.as_ref(), Some(&entry.new));
        }
    }

    #[test]
    fn test_noop_toggle_produces_no_entry() {
        let repo = repo();
        let rule = repo
            .create_rule(&admin(), new_rule("pain gate"), &Deadline::none())
            .unwrap();

        repo.toggle_rule_active(&admin(), rule.id, true, &Deadline::none())
            .unwrap();

        assert_eq!(repo.get_audit_log(Some(rule.id)).unwrap().len(), 1);
    }

    #[test]
    fn test_audit_failure_rolls_back_mutation() {
        let repo = RuleRepository::new(Arc::new(FailingAuditLog));
        let err = repo
            .create_rule(&admin(), new_rule("pain gate"), &Deadline::none())
            .unwrap_err();

        assert_eq!(err.kind, super::super::errors::RuleErrorKind::AuditWriteFailed);
        assert!(
            repo.list_rules().is_empty(),
            "R2 VIOLATION: rule persisted without audit entry"
        );
    }

    #[test]
    fn test_active_logic_edit_rejected() {
        let repo = repo();
        let rule = repo
            .create_rule(&admin(), new_rule("pain gate"), &Deadline::none())
            .unwrap();

        let err = repo
            .update_rule(
                &admin(),
                rule.id,
                RuleUpdate {
                    actions: Some(vec![RuleAction::AdjustQuality { delta: -0.5 }]),
                    ..Default::default()
                },
                &Deadline::none(),
            )
            .unwrap_err();
        assert_eq!(
            err.kind,
            super::super::errors::RuleErrorKind::ActiveLogicImmutable
        );

        // Deactivated rules accept logic edits
        repo.toggle_rule_active(&admin(), rule.id, false, &Deadline::none())
            .unwrap();
        repo.update_rule(
            &admin(),
            rule.id,
            RuleUpdate {
                actions: Some(vec![RuleAction::AdjustQuality { delta: -0.5 }]),
                ..Default::default()
            },
            &Deadline::none(),
        )
        .unwrap();
    }

    #[test]
    fn test_supersede_is_terminal() {
        let repo = repo();
        let old = repo
            .create_rule(&admin(), new_rule("pain gate v1"), &Deadline::none())
            .unwrap();
        let new = repo
            .create_rule(&admin(), new_rule("pain gate v2"), &Deadline::none())
            .unwrap();

        let superseded = repo
            .supersede(&admin(), old.id, new.id, &Deadline::none())
            .unwrap();
        assert!(!superseded.is_active);
        assert_eq!(superseded.superseded_by, Some(new.id));

        // Any further mutation of the old rule is rejected
        let err = repo
            .toggle_rule_active(&admin(), old.id, true, &Deadline::none())
            .unwrap_err();
        assert_eq!(
            err.kind,
            super::super::errors::RuleErrorKind::SupersededTerminal
        );
    }

    #[test]
    fn test_snapshot_excludes_inactive_superseded_expired() {
        let repo = repo();
        let active = repo
            .create_rule(&admin(), new_rule("active"), &Deadline::none())
            .unwrap();
        let inactive = repo
            .create_rule(&admin(), new_rule("inactive"), &Deadline::none())
            .unwrap();
        repo.toggle_rule_active(&admin(), inactive.id, false, &Deadline::none())
            .unwrap();

        let mut expired_input = new_rule("expired");
        expired_input.expires_at = Some(Utc::now() - chrono::Duration::hours(1));
        repo.create_rule(&admin(), expired_input, &Deadline::none())
            .unwrap();

        let snapshot = repo.snapshot(Utc::now());
        assert_eq!(snapshot.len(), 1, "R4 VIOLATION: snapshot includes ineligible rules");
        assert_eq!(snapshot.rules()[0].id, active.id);
    }

    #[test]
    fn test_sweep_expired_flips_with_audit() {
        let repo = repo();
        let mut input = new_rule("short lived");
        input.expires_at = Some(Utc::now() - chrono::Duration::minutes(5));
        let rule = repo
            .create_rule(&admin(), input, &Deadline::none())
            .unwrap();

        let flipped = repo
            .sweep_expired(&admin(), Utc::now(), &Deadline::none())
            .unwrap();
        assert_eq!(flipped, vec![rule.id]);
        assert!(!repo.get_rule(rule.id).unwrap().is_active);

        let log = repo.get_audit_log(Some(rule.id)).unwrap();
        assert_eq!(log.len(), 2); // Created + Deactivated
        assert_eq!(log[1].action, RuleAuditAction::Deactivated);
    }

    #[test]
    fn test_invalid_rule_rejected() {
        let repo = repo();
        let mut input = new_rule("no conditions");
        input.conditions.clear();
        assert!(repo
            .create_rule(&admin(), input, &Deadline::none())
            .is_err());
    }
}

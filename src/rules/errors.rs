//! Rule repository error types
//!
//! Per RULES.md §R2: a rule mutation and its audit entry are one atomic
//! unit. A mutation whose audit write fails is rolled back entirely and
//! surfaces `AuditWriteFailed` — partial state is a consistency violation.

use std::fmt;
use uuid::Uuid;

/// Rule error kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleErrorKind {
    /// Rule id is unknown
    RuleNotFound,

    /// Conditions/actions of an ACTIVE rule cannot be edited directly;
    /// supersede is the only sanctioned logic change (R3)
    ActiveLogicImmutable,

    /// Superseded is terminal; no further mutations allowed
    SupersededTerminal,

    /// The audit entry could not be written; the mutation was rolled back
    AuditWriteFailed,

    /// Rule shape is invalid (empty name, no conditions, no actions)
    InvalidRule,

    /// Caller deadline lapsed before the operation ran; nothing was applied
    DeadlineLapsed,
}

impl RuleErrorKind {
    /// Returns the string code as defined in ERRORS.md
    pub fn code(&self) -> &'static str {
        match self {
            RuleErrorKind::RuleNotFound => "BETA_RULE_NOT_FOUND",
            RuleErrorKind::ActiveLogicImmutable => "BETA_RULE_ACTIVE_LOGIC_IMMUTABLE",
            RuleErrorKind::SupersededTerminal => "BETA_RULE_SUPERSEDED_TERMINAL",
            RuleErrorKind::AuditWriteFailed => "BETA_RULE_AUDIT_WRITE_FAILED",
            RuleErrorKind::InvalidRule => "BETA_RULE_INVALID",
            RuleErrorKind::DeadlineLapsed => "BETA_DEADLINE_LAPSED",
        }
    }

    /// Returns the invariant protected by this rejection
    pub fn invariant(&self) -> &'static str {
        match self {
            RuleErrorKind::ActiveLogicImmutable => "R3",
            RuleErrorKind::SupersededTerminal => "R3",
            RuleErrorKind::AuditWriteFailed => "R2",
            _ => "R1",
        }
    }
}

/// Rule error type
#[derive(Debug, Clone)]
pub struct RuleError {
    /// Error kind
    pub kind: RuleErrorKind,
    /// Error message
    pub message: String,
}

impl RuleError {
    /// Create a new rule error.
    pub fn new(kind: RuleErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create a rule-not-found error.
    pub fn not_found(rule_id: Uuid) -> Self {
        Self::new(
            RuleErrorKind::RuleNotFound,
            format!("rule '{}' not found", rule_id),
        )
    }

    /// Create an active-logic-immutable error.
    pub fn active_logic_immutable(rule_id: Uuid) -> Self {
        Self::new(
            RuleErrorKind::ActiveLogicImmutable,
            format!(
                "rule '{}' is active; conditions/actions change only via supersede",
                rule_id
            ),
        )
    }

    /// Create a superseded-terminal error.
    pub fn superseded_terminal(rule_id: Uuid) -> Self {
        Self::new(
            RuleErrorKind::SupersededTerminal,
            format!("rule '{}' is superseded; no further mutations", rule_id),
        )
    }

    /// Create an audit-write-failed error. The mutation was rolled back.
    pub fn audit_write_failed(reason: impl fmt::Display) -> Self {
        Self::new(
            RuleErrorKind::AuditWriteFailed,
            format!("audit write failed, mutation rolled back: {}", reason),
        )
    }

    /// Create an invalid-rule error.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::new(RuleErrorKind::InvalidRule, reason)
    }

    /// Create a deadline-lapsed error. Nothing was applied.
    pub fn deadline_lapsed(op: &str) -> Self {
        Self::new(
            RuleErrorKind::DeadlineLapsed,
            format!("deadline lapsed before '{}' ran; nothing applied", op),
        )
    }
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} [violates {}]",
            self.kind.code(),
            self.message,
            self.kind.invariant()
        )
    }
}

impl std::error::Error for RuleError {}

/// Result type for rule operations
pub type RuleResult<T> = Result<T, RuleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            RuleErrorKind::AuditWriteFailed.code(),
            "BETA_RULE_AUDIT_WRITE_FAILED"
        );
        assert_eq!(RuleErrorKind::AuditWriteFailed.invariant(), "R2");
        assert_eq!(
            RuleErrorKind::ActiveLogicImmutable.invariant(),
            "R3"
        );
    }

    #[test]
    fn test_display() {
        let err = RuleError::audit_write_failed("disk full");
        let display = format!("{}", err);
        assert!(display.contains("rolled back"));
        assert!(display.contains("R2"));
    }
}

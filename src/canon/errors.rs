//! Canonicalizer error types following ERRORS.md
//!
//! Error codes:
//! - BETA_PLAN_EMPTY (REJECT)
//! - BETA_PLAN_UNKNOWN_ACTIVITY (REJECT)
//! - BETA_PLAN_MISSING_FIELD (REJECT)
//! - BETA_PLAN_TYPE_MISMATCH (REJECT)
//! - BETA_PLAN_OUT_OF_RANGE (REJECT)
//!
//! Per CANON.md §C1: a plan that violates its schema is rejected BEFORE
//! hashing and is never stored.

use std::fmt;

/// Canonicalizer-specific error codes as defined in ERRORS.md
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonErrorCode {
    /// Plan has no phases, a phase has no blocks, or a block has no items
    BetaPlanEmpty,
    /// Activity tag is not one of the closed activity set
    BetaPlanUnknownActivity,
    /// Required dose field is absent
    BetaPlanMissingField,
    /// Field present with the wrong JSON type
    BetaPlanTypeMismatch,
    /// Numeric dose field outside its allowed range
    BetaPlanOutOfRange,
}

impl CanonErrorCode {
    /// Returns the string code as defined in ERRORS.md
    pub fn code(&self) -> &'static str {
        match self {
            CanonErrorCode::BetaPlanEmpty => "BETA_PLAN_EMPTY",
            CanonErrorCode::BetaPlanUnknownActivity => "BETA_PLAN_UNKNOWN_ACTIVITY",
            CanonErrorCode::BetaPlanMissingField => "BETA_PLAN_MISSING_FIELD",
            CanonErrorCode::BetaPlanTypeMismatch => "BETA_PLAN_TYPE_MISMATCH",
            CanonErrorCode::BetaPlanOutOfRange => "BETA_PLAN_OUT_OF_RANGE",
        }
    }

    /// Returns the invariant violated by this error
    pub fn invariant(&self) -> &'static str {
        // All canonicalizer rejections protect C1 (validate before hash)
        "C1"
    }
}

impl fmt::Display for CanonErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Details for a single validation failure
#[derive(Debug, Clone)]
pub struct PlanViolation {
    /// Field path (e.g., "phases[0].blocks[1].items[2].attempts")
    pub field: String,
    /// Expected type or condition
    pub expected: String,
    /// Actual value or type found
    pub actual: String,
}

impl PlanViolation {
    pub fn new(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            expected: "field to be present".into(),
            actual: "missing".into(),
        }
    }

    pub fn type_mismatch(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn out_of_range(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

impl fmt::Display for PlanViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "field '{}': expected {}, got {}",
            self.field, self.expected, self.actual
        )
    }
}

/// Validation error raised when a plan violates its schema.
///
/// This is the `ValidationError` of the capture boundary: it is raised
/// before hashing and the offending plan is never stored.
#[derive(Debug, Clone)]
pub struct ValidationError {
    code: CanonErrorCode,
    message: String,
    violation: Option<PlanViolation>,
}

impl ValidationError {
    /// Create an empty-plan error
    pub fn empty_plan(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            code: CanonErrorCode::BetaPlanEmpty,
            message: format!("plan is empty at '{}'", field),
            violation: Some(PlanViolation::new(field, "at least one entry", "empty")),
        }
    }

    /// Create an unknown-activity error
    pub fn unknown_activity(field: impl Into<String>, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        Self {
            code: CanonErrorCode::BetaPlanUnknownActivity,
            message: format!("unknown activity type '{}'", tag),
            violation: Some(PlanViolation::new(
                field,
                "one of: climbing, strength, mobility, endurance, rest",
                tag,
            )),
        }
    }

    /// Create a missing-field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        let violation = PlanViolation::missing_field(field);
        Self {
            code: CanonErrorCode::BetaPlanMissingField,
            message: format!("plan validation failed: {}", violation),
            violation: Some(violation),
        }
    }

    /// Create a type-mismatch error
    pub fn type_mismatch(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        let violation = PlanViolation::type_mismatch(field, expected, actual);
        Self {
            code: CanonErrorCode::BetaPlanTypeMismatch,
            message: format!("plan validation failed: {}", violation),
            violation: Some(violation),
        }
    }

    /// Create an out-of-range error
    pub fn out_of_range(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        let violation = PlanViolation::out_of_range(field, expected, actual);
        Self {
            code: CanonErrorCode::BetaPlanOutOfRange,
            message: format!("plan validation failed: {}", violation),
            violation: Some(violation),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> CanonErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the violation details if applicable
    pub fn violation(&self) -> Option<&PlanViolation> {
        self.violation.as_ref()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REJECT] {}: {}", self.code.code(), self.message)?;
        write!(f, " [violates {}]", self.code.invariant())
    }
}

impl std::error::Error for ValidationError {}

/// Result type for canonicalizer operations
pub type CanonResult<T> = Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(CanonErrorCode::BetaPlanEmpty.code(), "BETA_PLAN_EMPTY");
        assert_eq!(
            CanonErrorCode::BetaPlanUnknownActivity.code(),
            "BETA_PLAN_UNKNOWN_ACTIVITY"
        );
        assert_eq!(
            CanonErrorCode::BetaPlanMissingField.code(),
            "BETA_PLAN_MISSING_FIELD"
        );
        assert_eq!(
            CanonErrorCode::BetaPlanTypeMismatch.code(),
            "BETA_PLAN_TYPE_MISMATCH"
        );
        assert_eq!(
            CanonErrorCode::BetaPlanOutOfRange.code(),
            "BETA_PLAN_OUT_OF_RANGE"
        );
    }

    #[test]
    fn test_violation_display() {
        let violation = PlanViolation::type_mismatch("attempts", "integer", "string");
        let display = format!("{}", violation);
        assert!(display.contains("attempts"));
        assert!(display.contains("integer"));
        assert!(display.contains("string"));
    }

    #[test]
    fn test_error_includes_invariant() {
        let err = ValidationError::missing_field("phases[0].blocks[0].items[0].attempts");
        let display = format!("{}", err);
        assert!(display.contains("C1"));
        assert!(display.contains("BETA_PLAN_MISSING_FIELD"));
    }
}

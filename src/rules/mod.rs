//! Rule Repository, Audit Log, and Evaluation Engine
//!
//! Per RULES.md:
//! - R1: every state-changing rule operation produces exactly one audit
//!   entry with previous/new snapshots
//! - R2: rule mutation + audit append are one atomic unit; an append
//!   failure rolls the mutation back entirely
//! - R3: supersede is the only sanctioned logic change to an active rule;
//!   superseded is terminal
//! - R4: an expired, still-active rule is treated as inactive by the
//!   evaluator even before housekeeping flips the flag
//! - R5: evaluation is a pure function of (session state, rule snapshot);
//!   concurrent edits never affect an in-flight evaluation
//! - R6: safety-category messages surface as warnings, all others as
//!   suggestions
//! - R7: "no matching rules" is a baseline result, never an error

mod audit;
mod errors;
mod evaluation;
mod repository;
mod rule;
mod session;

pub use audit::{
    FailingAuditLog, FileAuditLog, MemoryAuditLog, RuleAuditAction, RuleAuditEntry, RuleAuditLog,
};
pub use errors::{RuleError, RuleErrorKind, RuleResult};
pub use evaluation::{evaluate, ConfidenceWeights, EvaluationConfig, RecommendationResponse};
pub use repository::{NewRule, RuleRepository, RuleSnapshot, RuleUpdate};
pub use rule::{
    ConditionOp, Rule, RuleAction, RuleCategory, RuleCondition, RuleConfidence,
};
pub use session::{FieldValue, SessionState};

//! Action Canonicalizer
//!
//! Per CANON.md:
//! - Plans are validated into a closed set of typed activity variants
//!   BEFORE anything is hashed or stored (C1)
//! - Canonicalization is deterministic and key-order independent (C2, C3)
//! - The action id is a pure function of canonical content plus the
//!   engine version (C4)
//!
//! The action id is the cross-expert join key: two experts prescribing the
//! same plan for the same scenario produce the same id.

mod canonical;
mod dose;
mod errors;
mod plan;

pub use canonical::{canonicalize, canonicalize_plan, ActionId, CanonicalAction};
pub use dose::{DoseFeatures, HI_INTENSITY_THRESHOLD};
pub use errors::{CanonErrorCode, CanonResult, PlanViolation, ValidationError};
pub use plan::{
    Activity, ClimbStyle, ClimbingDose, EnduranceDose, MobilityDose, PlanBlock, PlanPhase,
    RestDose, StrengthDose, WorkoutPlan,
};

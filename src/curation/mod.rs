//! Curation Gate + Case Library
//!
//! Per CURATION.md:
//! - G1: promotion is one-way; curated cases are never edited, only
//!   superseded
//! - G2: promotion is idempotent, including under concurrent retries
//! - G3: rejection keeps the raw recommendation inspectable and is never
//!   auto-retried
//! - G4: the gate is a weighted rubric score against a version-specific
//!   threshold; failing it is a normal outcome, not an error

mod case;
mod errors;
mod gate;
mod rubric;

pub use case::LibraryCase;
pub use errors::{CurationError, CurationResult};
pub use gate::{CurationConfig, CurationGate, PromotionOutcome};
pub use rubric::{RubricDimension, RubricScores, RubricVersion, RubricWeights};

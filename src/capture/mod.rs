//! Expert Capture Store
//!
//! Per CONCURRENCY.md §2:
//! - X1: one raw recommendation per (episode, expert, step); same-expert
//!   resubmission overwrites via upsert, never duplicates
//! - X2: a submission must reference the current head state for its
//!   episode; stale submissions are rejected with `StaleState`
//! - X3: dose features are materialized at capture time so downstream
//!   consumers never re-parse free-form plan JSON

mod errors;
mod recommendation;
mod store;

pub use errors::{CaptureError, CaptureResult};
pub use recommendation::{
    ExpertRecommendation, PredictedOutcomes, RubricStatus, SessionType, SubmitInput,
};
pub use store::CaptureStore;

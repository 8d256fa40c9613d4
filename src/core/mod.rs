//! Core wiring
//!
//! The `BetaLab` service assembles the pipeline; `RequestContext` carries
//! explicit actor identity and deadlines through every operation. No
//! subsystem reads ambient user or clock state to make decisions.

mod context;
mod service;

pub use context::{ActorId, Deadline, ExpertId, RequestContext};
pub use service::BetaLab;

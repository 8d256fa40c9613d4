//! Observability
//!
//! Per OBSERVABILITY.md:
//! - Structured logging (JSON), deterministic key ordering
//! - Explicit typed events
//! - Observability is read-only: no side effects on execution, no
//!   background threads

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

//! Request context, actor identity, and deadlines
//!
//! Per CONCURRENCY.md §4:
//! - Every capture, promotion, and rule mutation carries an EXPLICIT actor
//!   identity; there is no ambient "current user"
//! - Store operations are bounded by a caller-supplied deadline and fail
//!   closed (treated as not-yet-available) rather than partially apply

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Explicit identity of the human or service performing an operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of an expert submitting recommendations.
pub type ExpertId = ActorId;

/// A caller-supplied operation deadline.
///
/// `Deadline::none()` means unbounded. A lapsed deadline makes store
/// operations fail closed before touching any state.
#[derive(Debug, Clone, Copy)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// No deadline.
    pub fn none() -> Self {
        Self(None)
    }

    /// Deadline `timeout` from now.
    pub fn within(timeout: Duration) -> Self {
        Self(Some(Instant::now() + timeout))
    }

    /// An already-lapsed deadline, for fail-closed tests.
    pub fn already_lapsed() -> Self {
        Self(Some(Instant::now() - Duration::from_millis(1)))
    }

    /// Whether the deadline has lapsed.
    pub fn lapsed(&self) -> bool {
        match self.0 {
            Some(at) => Instant::now() >= at,
            None => false,
        }
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::none()
    }
}

/// Context carried through core operations.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Request ID for log correlation
    pub request_id: Uuid,

    /// Who is performing the operation
    pub actor: ActorId,

    /// Operation deadline
    pub deadline: Deadline,

    /// Start time for duration tracking
    started_at: Instant,
}

impl RequestContext {
    /// Create a new context for an actor.
    pub fn new(actor: ActorId) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            actor,
            deadline: Deadline::none(),
            started_at: Instant::now(),
        }
    }

    /// Attach a deadline.
    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = deadline;
        self
    }

    /// Elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> u128 {
        self.started_at.elapsed().as_millis()
    }
}

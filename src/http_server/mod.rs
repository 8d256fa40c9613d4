//! # HTTP Server Module
//!
//! JSON-over-HTTP adapter for the BetaLab core. The wire format is an
//! application convenience, not part of the core's hard contract: every
//! handler validates, delegates to `core::BetaLab`, and maps module
//! errors to status codes in `response.rs`.
//!
//! # Endpoints
//!
//! - `/health` — liveness + engine version
//! - `/episodes*` — scenario simulator
//! - `/recommendations*` — expert capture
//! - `/cases/*` — curation gate + library search
//! - `/consensus/*` — consensus aggregation
//! - `/rules*`, `/recommendation` — rule administration + serving

pub mod capture_routes;
pub mod consensus_routes;
pub mod curation_routes;
pub mod response;
pub mod rules_routes;
pub mod scenario_routes;
pub mod server;

pub use server::HttpServer;

use crate::core::Deadline;
use std::time::Duration;

/// Build a deadline from an optional request timeout.
pub(crate) fn deadline_from(timeout_ms: Option<u64>) -> Deadline {
    match timeout_ms {
        Some(ms) => Deadline::within(Duration::from_millis(ms)),
        None => Deadline::none(),
    }
}

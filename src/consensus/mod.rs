//! Consensus Aggregator
//!
//! Per CONSENSUS.md:
//! - N1: a scenario has no consensus record until `min_experts` complete
//!   responses exist; staying pending is a normal outcome
//! - N2: agreement = 1 − normalized dispersion of predicted quality
//! - N3: a record marked processed-into-priors is immutable
//!
//! The central-tendency method, expert threshold, and dispute tolerance are
//! configuration, not constants.

mod aggregator;
mod policy;
mod record;

pub use aggregator::{ConsensusAggregator, ConsensusConfig, ConsensusError, ConsensusResult};
pub use policy::{dispersion, ConsensusPolicy, DEFAULT_CONFIDENCE};
pub use record::ScenarioConsensus;

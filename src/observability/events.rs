//! Observable events
//!
//! Per OBSERVABILITY.md: events are explicit and typed. Every lifecycle
//! step of the capture pipeline emits exactly one event.

use std::fmt;

/// Observable events in the capture pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Boot & lifecycle
    /// Startup begins
    BootStart,
    /// Startup complete, ready to serve
    BootComplete,
    /// Shutdown initiated
    ShutdownStart,
    /// Configuration loaded
    ConfigLoaded,

    // Scenario simulator
    /// Episode created and initial state derived
    EpisodeStarted,
    /// Episode advanced one step
    EpisodeAdvanced,
    /// Episode reached its terminal state
    EpisodeTerminal,
    /// An advance lost its optimistic race
    AdvanceConflict,

    // Expert capture
    /// Raw recommendation stored (insert or overwrite)
    RecommendationCaptured,
    /// Submission rejected against a superseded state
    StaleSubmissionRejected,

    // Curation
    /// Raw case promoted into the library
    CasePromoted,
    /// Rubric score below threshold; case flagged for review
    CaseHeldForReview,

    // Consensus
    /// Consensus record computed
    ConsensusComputed,
    /// Consensus record frozen into priors
    ConsensusProcessed,

    // Rules
    /// Rule created
    RuleCreated,
    /// Rule metadata modified
    RuleModified,
    /// Rule activated
    RuleActivated,
    /// Rule deactivated
    RuleDeactivated,
    /// Rule superseded
    RuleSuperseded,
    /// Expired rules swept
    ExpirySweepComplete,

    // Serving
    /// Recommendation served from a rule snapshot
    EvaluationServed,
}

impl Event {
    /// Returns the event name string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "BOOT_START",
            Event::BootComplete => "BOOT_COMPLETE",
            Event::ShutdownStart => "SHUTDOWN_START",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::EpisodeStarted => "EPISODE_STARTED",
            Event::EpisodeAdvanced => "EPISODE_ADVANCED",
            Event::EpisodeTerminal => "EPISODE_TERMINAL",
            Event::AdvanceConflict => "ADVANCE_CONFLICT",
            Event::RecommendationCaptured => "RECOMMENDATION_CAPTURED",
            Event::StaleSubmissionRejected => "STALE_SUBMISSION_REJECTED",
            Event::CasePromoted => "CASE_PROMOTED",
            Event::CaseHeldForReview => "CASE_HELD_FOR_REVIEW",
            Event::ConsensusComputed => "CONSENSUS_COMPUTED",
            Event::ConsensusProcessed => "CONSENSUS_PROCESSED",
            Event::RuleCreated => "RULE_CREATED",
            Event::RuleModified => "RULE_MODIFIED",
            Event::RuleActivated => "RULE_ACTIVATED",
            Event::RuleDeactivated => "RULE_DEACTIVATED",
            Event::RuleSuperseded => "RULE_SUPERSEDED",
            Event::ExpirySweepComplete => "EXPIRY_SWEEP_COMPLETE",
            Event::EvaluationServed => "EVALUATION_SERVED",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

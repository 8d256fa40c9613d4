//! Pure transition functions
//!
//! Per SCENARIO.md §4:
//! - `initial_state` derives t=0 from the persona baseline and the episode
//!   seed; `advance_state` derives t+1 from the previous state alone
//! - Both are pure: no clocks, no ambient randomness, no hidden state.
//!   All draws come from the episode's recorded RNG stream, in a FIXED
//!   order every step, so the stream position is identical across replays
//! - Event scheduling: an active event occupies the state until its
//!   duration elapses; a class on cooldown or out of budget must NEVER
//!   trigger (SM4)

use super::params::{EventSpec, TransitionParamSet};
use super::rng::DeterministicRng;
use super::state::{
    ActiveEvent, Constraints, EventClass, EventLedger, LatentState, LatentUncertainty,
    PersonaBaseline, ScenarioState, TrainingPhase,
};
use uuid::Uuid;

/// Readiness weighting over (freshness, fitness, motivation).
const READINESS_WEIGHTS: (f64, f64, f64) = (0.4, 0.3, 0.3);

/// Initial latent uncertainty before any observations.
const INITIAL_UNCERTAINTY: f64 = 0.10;

/// Uncertainty ceiling.
const MAX_UNCERTAINTY: f64 = 0.35;

/// Derive the initial (t=0) state for an episode.
pub fn initial_state(
    episode_id: Uuid,
    rng_seed: u64,
    engine_version: &str,
    persona: PersonaBaseline,
    params: &TransitionParamSet,
) -> ScenarioState {
    let mut rng = DeterministicRng::new(rng_seed);

    // Fixed draw order: fatigue, fitness noise, motivation noise, availability
    let fatigue = rng.next_range(0.1, 0.4);
    let fitness = clamp_unit(persona.ability + rng.next_noise(params.noise_scale));
    let motivation = clamp_unit(persona.baseline_motivation + rng.next_noise(params.noise_scale));
    let available_min = 45 + (rng.next_unit() * 60.0) as u32;

    let latent = LatentState {
        fatigue,
        fitness,
        motivation,
        injury_risk: clamp_unit(persona.injury_proneness * (0.5 + fatigue)),
    };

    let constraints = Constraints {
        available_min,
        has_pain: false,
        full_facility: true,
    };

    let readiness = readiness_of(&latent, None);
    let rng_state = rng.state();

    ScenarioState {
        scenario_state_id: ScenarioState::derive_id(episode_id, 0, rng_state),
        episode_id,
        t_index: 0,
        prev_scenario_state_id: None,
        persona,
        latent,
        uncertainty: LatentUncertainty {
            fatigue_sd: INITIAL_UNCERTAINTY,
            fitness_sd: INITIAL_UNCERTAINTY,
            motivation_sd: INITIAL_UNCERTAINTY,
        },
        readiness,
        constraints,
        phase: phase_at(0, params),
        active_event: None,
        events: EventLedger::default(),
        rng_seed,
        rng_state,
        engine_version: engine_version.to_string(),
    }
}

/// Derive the successor of `prev`.
///
/// Replaying this function on the same `prev` and `params` reproduces the
/// same successor bit-for-bit (SM2).
pub fn advance_state(prev: &ScenarioState, params: &TransitionParamSet) -> ScenarioState {
    let mut rng = DeterministicRng::from_state(prev.rng_state);
    let t_index = prev.t_index + 1;

    // --- Fixed draw order, consumed unconditionally ---------------------
    let fatigue_noise = rng.next_noise(params.noise_scale);
    let fitness_noise = rng.next_noise(params.noise_scale);
    let motivation_noise = rng.next_noise(params.noise_scale);
    let availability_draw = rng.next_unit();
    let event_draws: Vec<f64> = params.events.iter().map(|_| rng.next_unit()).collect();

    // --- Event bookkeeping ----------------------------------------------
    let mut ledger = prev.events.clone();
    for cooldown in ledger.cooldowns.values_mut() {
        *cooldown = cooldown.saturating_sub(1);
    }

    // Tick the active event down before considering new triggers.
    let mut active_event = match &prev.active_event {
        Some(event) if event.remaining_steps > 1 => Some(ActiveEvent {
            class: event.class,
            remaining_steps: event.remaining_steps - 1,
            severity: event.severity,
        }),
        _ => None,
    };

    // Trigger at most one new event per step, in declaration order.
    // Gates are checked AFTER the draw so the stream position never
    // depends on ledger contents (SM2), and a gated class never triggers
    // regardless of its draw (SM4).
    if active_event.is_none() {
        for (spec, draw) in params.events.iter().zip(event_draws.iter()) {
            if *draw >= spec.probability {
                continue;
            }
            if !eligible(spec, &ledger) {
                continue;
            }
            active_event = Some(ActiveEvent {
                class: spec.class,
                remaining_steps: spec.duration_steps,
                severity: spec.severity,
            });
            ledger
                .cooldowns
                .insert(spec.class, spec.duration_steps + spec.cooldown_steps);
            *ledger.budget_spent.entry(spec.class).or_insert(0) += 1;
            break;
        }
    }

    // --- Latent dynamics ------------------------------------------------
    let persona = prev.persona.clone();
    let mut fatigue =
        prev.latent.fatigue * (1.0 - params.fatigue_recovery) + fatigue_noise;
    let mut fitness = prev.latent.fitness + params.fitness_gain + fitness_noise;
    let mut motivation = prev.latent.motivation
        + params.motivation_reversion * (persona.baseline_motivation - prev.latent.motivation)
        + motivation_noise;

    if let Some(event) = &active_event {
        match event.class {
            EventClass::FingerTweak => {
                motivation -= 0.1 * event.severity;
            }
            EventClass::Illness => {
                fatigue += 0.3 * event.severity;
                fitness -= 0.05 * event.severity;
            }
            EventClass::PoorSleep => {
                fatigue += 0.2 * event.severity;
            }
            EventClass::ScheduleCrunch => {
                motivation -= 0.05 * event.severity;
            }
        }
    }

    fatigue = clamp_unit(fatigue);
    fitness = clamp_unit(fitness);
    motivation = clamp_unit(motivation);

    let injury_risk = clamp_unit(
        persona.injury_proneness * (0.4 + fatigue)
            + if matches!(
                active_event,
                Some(ActiveEvent {
                    class: EventClass::FingerTweak,
                    ..
                })
            ) {
                0.3
            } else {
                0.0
            },
    );

    let latent = LatentState {
        fatigue,
        fitness,
        motivation,
        injury_risk,
    };

    // --- Constraints ----------------------------------------------------
    let mut available_min = 45 + (availability_draw * 60.0) as u32;
    if matches!(
        active_event,
        Some(ActiveEvent {
            class: EventClass::ScheduleCrunch,
            ..
        })
    ) {
        available_min = available_min.min(30);
    }

    let constraints = Constraints {
        available_min,
        has_pain: matches!(
            active_event,
            Some(ActiveEvent {
                class: EventClass::FingerTweak,
                ..
            })
        ),
        full_facility: prev.constraints.full_facility,
    };

    // --- Uncertainty grows until an observation collapses it ------------
    let uncertainty = LatentUncertainty {
        fatigue_sd: grow_sd(prev.uncertainty.fatigue_sd, params.uncertainty_growth),
        fitness_sd: grow_sd(prev.uncertainty.fitness_sd, params.uncertainty_growth),
        motivation_sd: grow_sd(prev.uncertainty.motivation_sd, params.uncertainty_growth),
    };

    let readiness = readiness_of(&latent, active_event.as_ref());
    let rng_state = rng.state();

    ScenarioState {
        scenario_state_id: ScenarioState::derive_id(prev.episode_id, t_index, rng_state),
        episode_id: prev.episode_id,
        t_index,
        prev_scenario_state_id: Some(prev.scenario_state_id),
        persona,
        latent,
        uncertainty,
        readiness,
        constraints,
        phase: phase_at(t_index, params),
        active_event,
        events: ledger,
        rng_seed: prev.rng_seed,
        rng_state,
        engine_version: prev.engine_version.clone(),
    }
}

/// Whether an event class may trigger (SM4).
fn eligible(spec: &EventSpec, ledger: &EventLedger) -> bool {
    ledger.cooldown(spec.class) == 0 && ledger.spent(spec.class) < spec.budget
}

/// Composite readiness in [0, 1].
fn readiness_of(latent: &LatentState, active_event: Option<&ActiveEvent>) -> f64 {
    let (w_fresh, w_fit, w_mot) = READINESS_WEIGHTS;
    let base =
        w_fresh * (1.0 - latent.fatigue) + w_fit * latent.fitness + w_mot * latent.motivation;
    let penalty = active_event.map(|e| 0.2 * e.severity).unwrap_or(0.0);
    clamp_unit(base - penalty)
}

/// Training phase for a step index, cycling base → build → peak → deload.
fn phase_at(t_index: u32, params: &TransitionParamSet) -> TrainingPhase {
    let cycle: u32 = params.phase_lengths.iter().sum();
    if cycle == 0 {
        return TrainingPhase::Base;
    }
    let pos = t_index % cycle;
    let [base, build, peak, _] = params.phase_lengths;
    if pos < base {
        TrainingPhase::Base
    } else if pos < base + build {
        TrainingPhase::Build
    } else if pos < base + build + peak {
        TrainingPhase::Peak
    } else {
        TrainingPhase::Deload
    }
}

fn clamp_unit(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

fn grow_sd(sd: f64, growth: f64) -> f64 {
    (sd + growth).min(MAX_UNCERTAINTY)
}

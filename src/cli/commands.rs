//! CLI command implementations
//!
//! `init` writes a default config, `serve` boots the HTTP server,
//! `simulate` runs one seeded episode and prints the chain — handy for
//! eyeballing determinism: the same seed always prints the same chain.

use std::path::Path;
use std::sync::Arc;

use super::errors::{CliError, CliResult};
use crate::config::BetaLabConfig;
use crate::core::{BetaLab, Deadline};
use crate::http_server::HttpServer;
use crate::observability::{Event, Logger};

/// `betalab init`: write the default configuration file.
pub fn init(config_path: &Path) -> CliResult<()> {
    BetaLabConfig::write_default(config_path).map_err(|e| CliError::config(e.to_string()))?;
    println!("wrote default config to {}", config_path.display());
    Ok(())
}

/// `betalab serve`: load config, assemble the core, serve HTTP.
pub fn serve(config_path: &Path) -> CliResult<()> {
    Logger::info(Event::BootStart.as_str(), &[]);

    let config = BetaLabConfig::load(config_path).map_err(|e| CliError::config(e.to_string()))?;
    Logger::info(
        Event::ConfigLoaded.as_str(),
        &[("path", &config_path.display().to_string())],
    );

    let lab = BetaLab::open(config.clone()).map_err(|e| CliError::io(e.to_string()))?;
    let server = HttpServer::new(config.http, Arc::new(lab));

    let runtime = tokio::runtime::Runtime::new().map_err(|e| CliError::boot(e.to_string()))?;
    runtime
        .block_on(server.start())
        .map_err(|e| CliError::boot(e.to_string()))
}

/// `betalab simulate`: run one seeded episode and print each state.
pub fn simulate(config_path: &Path, seed: u64, steps: u32, param_set: &str) -> CliResult<()> {
    // Config is optional here; fall back to defaults when absent
    let config = if config_path.exists() {
        BetaLabConfig::load(config_path).map_err(|e| CliError::config(e.to_string()))?
    } else {
        BetaLabConfig::default()
    };

    let lab = BetaLab::new(config);
    let (episode, initial) = lab
        .start_episode(Some(seed), Some(param_set), None, &Deadline::none())
        .map_err(|e| CliError::simulate(e.to_string()))?;

    print_state_line(&initial);
    for _ in 0..steps {
        let state = match lab.advance_episode(episode.episode_id, None, &Deadline::none()) {
            Ok(state) => state,
            Err(e) if e.kind == crate::scenario::ScenarioErrorKind::EpisodeTerminal => break,
            Err(e) => return Err(CliError::simulate(e.to_string())),
        };
        print_state_line(&state);
    }
    Ok(())
}

fn print_state_line(state: &crate::scenario::ScenarioState) {
    let event = state
        .active_event
        .as_ref()
        .map(|e| e.class.as_str())
        .unwrap_or("-");
    println!(
        "t={:<3} phase={:<7} readiness={:.3} fatigue={:.3} motivation={:.3} pain={} event={}",
        state.t_index,
        state.phase.as_str(),
        state.readiness,
        state.latent.fatigue,
        state.latent.motivation,
        state.constraints.has_pain,
        event,
    );
}

/// Dispatch a parsed CLI invocation.
pub fn run_command(cli: super::args::Cli) -> CliResult<()> {
    match cli.command {
        super::args::Command::Init { config } => init(&config),
        super::args::Command::Serve { config } => serve(&config),
        super::args::Command::Simulate {
            config,
            seed,
            steps,
            param_set,
        } => simulate(&config, seed, steps, &param_set),
    }
}

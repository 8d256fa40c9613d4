//! CLI argument definitions using clap
//!
//! Commands:
//! - betalab init --config <path>
//! - betalab serve --config <path>
//! - betalab simulate --config <path> --seed <u64> --steps <n>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// BetaLab - deterministic expert-capture and rule-learning core
#[derive(Parser, Debug)]
#[command(name = "betalab")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default configuration file
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./betalab.json")]
        config: PathBuf,
    },

    /// Start the HTTP server
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./betalab.json")]
        config: PathBuf,
    },

    /// Run one seeded episode to its step limit and print the chain
    Simulate {
        /// Path to configuration file
        #[arg(long, default_value = "./betalab.json")]
        config: PathBuf,

        /// Episode seed; the same seed always prints the same chain
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Steps to advance
        #[arg(long, default_value_t = 12)]
        steps: u32,

        /// Transition parameter set id
        #[arg(long, default_value = "default-v1")]
        param_set: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

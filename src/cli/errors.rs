//! CLI-specific error types
//!
//! All CLI errors are fatal: the process prints the error and exits
//! non-zero.

use std::fmt;

/// CLI error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// Data directory or log I/O error
    IoError,
    /// Boot failed
    BootFailed,
    /// Simulation failed
    SimulateFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "BETA_CLI_CONFIG_ERROR",
            Self::IoError => "BETA_CLI_IO_ERROR",
            Self::BootFailed => "BETA_CLI_BOOT_FAILED",
            Self::SimulateFailed => "BETA_CLI_SIMULATE_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, message)
    }

    pub fn boot(message: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BootFailed, message)
    }

    pub fn simulate(message: impl Into<String>) -> Self {
        Self::new(CliErrorCode::SimulateFailed, message)
    }

    pub fn code(&self) -> CliErrorCode {
        self.code
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[FATAL] {}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

//! BetaLab configuration
//!
//! A single JSON file configures the whole core: data directory, HTTP
//! bind, rubric versions, consensus policy, and evaluation parameters.
//! Every field has a default, so an empty object `{}` is a valid config.
//! Policy knobs (rubric weights/thresholds, consensus method, confidence
//! damping) live HERE, not in code.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::consensus::ConsensusConfig;
use crate::curation::CurationConfig;
use crate::rules::EvaluationConfig;

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to
    #[serde(default = "default_port")]
    pub port: u16,

    /// CORS allowed origins; empty means permissive (development)
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    7070
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

impl HttpConfig {
    /// Get the socket address string.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Scenario simulator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Step limit per episode
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
}

fn default_max_steps() -> u32 {
    crate::scenario::DEFAULT_MAX_STEPS
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetaLabConfig {
    /// Data directory (rule audit log lives here)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub scenario: ScenarioConfig,

    #[serde(default)]
    pub curation: CurationConfig,

    #[serde(default)]
    pub consensus: ConsensusConfig,

    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./betalab_data")
}

impl Default for BetaLabConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            http: HttpConfig::default(),
            scenario: ScenarioConfig::default(),
            curation: CurationConfig::default(),
            consensus: ConsensusConfig::default(),
            evaluation: EvaluationConfig::default(),
        }
    }
}

impl BetaLabConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;
        serde_json::from_str(&contents)
            .map_err(|e| ConfigError::Malformed(path.to_path_buf(), e.to_string()))
    }

    /// Write the default configuration to a file. Refuses to overwrite.
    pub fn write_default(path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            return Err(ConfigError::AlreadyExists(path.to_path_buf()));
        }
        let contents = serde_json::to_string_pretty(&Self::default())
            .map_err(|e| ConfigError::Malformed(path.to_path_buf(), e.to_string()))?;
        fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))
    }

    /// Path of the rule audit log inside the data directory.
    pub fn audit_log_path(&self) -> PathBuf {
        self.data_dir.join("rule_audit.log")
    }
}

/// Configuration errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config '{0}': {1}")]
    Io(PathBuf, String),

    #[error("malformed config '{0}': {1}")]
    Malformed(PathBuf, String),

    #[error("config '{0}' already exists; refusing to overwrite")]
    AlreadyExists(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_empty_object_is_valid_config() {
        let config: BetaLabConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.http.port, 7070);
        assert_eq!(config.scenario.max_steps, crate::scenario::DEFAULT_MAX_STEPS);
        assert_eq!(config.consensus.min_experts, 2);
        assert_eq!(config.curation.default_version, "v1");
    }

    #[test]
    fn test_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("betalab.json");

        BetaLabConfig::write_default(&path).unwrap();
        let loaded = BetaLabConfig::load(&path).unwrap();
        assert_eq!(loaded.http.socket_addr(), "127.0.0.1:7070");
    }

    #[test]
    fn test_write_default_refuses_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("betalab.json");
        BetaLabConfig::write_default(&path).unwrap();
        assert!(matches!(
            BetaLabConfig::write_default(&path),
            Err(ConfigError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_malformed_config_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("betalab.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            BetaLabConfig::load(&path),
            Err(ConfigError::Malformed(_, _))
        ));
    }

    #[test]
    fn test_partial_override() {
        let config: BetaLabConfig =
            serde_json::from_str(r#"{"http": {"port": 9000}, "consensus": {"min_experts": 3}}"#)
                .unwrap();
        assert_eq!(config.http.port, 9000);
        assert_eq!(config.http.host, "127.0.0.1");
        assert_eq!(config.consensus.min_experts, 3);
    }
}

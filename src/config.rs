// Node Configuration - parameters shared by every node of a run

use crate::ledger::NodeId;
use crate::sync::{GossipConfig, ValidationMode, DEFAULT_MAX_FAULTY};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default number of participants (and genesis outputs)
pub const DEFAULT_PARTICIPANTS: u32 = 10;

/// Default value of each genesis output
pub const DEFAULT_GENESIS_AMOUNT: u64 = 10_000;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(String),
}

/// Configuration of a simulation run, identical on every node
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Number of participants; genesis creates one output per participant
    pub participants: u32,
    /// Value of each genesis output
    pub genesis_amount: u64,
    /// Tolerated number of faulty nodes; a node halts when an accusation
    /// count exceeds it
    pub max_faulty: u32,
    /// The node that issues the demonstration transactions
    pub starter: NodeId,
    /// Gossip engine settings
    pub gossip: GossipConfig,
    /// Runner-side idle timeout in milliseconds (0 disables it)
    pub idle_timeout_ms: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            participants: DEFAULT_PARTICIPANTS,
            genesis_amount: DEFAULT_GENESIS_AMOUNT,
            max_faulty: DEFAULT_MAX_FAULTY,
            starter: NodeId::new(0),
            gossip: GossipConfig::default(),
            idle_timeout_ms: 2_000,
        }
    }
}

impl NodeConfig {
    /// Create a new config builder
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_participants(mut self, participants: u32) -> Self {
        self.participants = participants;
        self
    }

    pub fn with_genesis_amount(mut self, amount: u64) -> Self {
        self.genesis_amount = amount;
        self
    }

    pub fn with_max_faulty(mut self, max_faulty: u32) -> Self {
        self.max_faulty = max_faulty;
        self
    }

    pub fn with_starter(mut self, starter: NodeId) -> Self {
        self.starter = starter;
        self
    }

    pub fn with_validation(mut self, validation: ValidationMode) -> Self {
        self.gossip.validation = validation;
        self
    }

    pub fn with_gossip(mut self, gossip: GossipConfig) -> Self {
        self.gossip = gossip;
        self
    }

    pub fn with_idle_timeout_ms(mut self, ms: u64) -> Self {
        self.idle_timeout_ms = ms;
        self
    }

    /// Idle timeout as a duration, `None` when disabled
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_ms > 0).then(|| Duration::from_millis(self.idle_timeout_ms))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.participants < 3 {
            return Err(ConfigError::Invalid(
                "participants must be at least 3 (starter plus two peers)".to_string(),
            ));
        }
        if self.starter.as_u32() >= self.participants {
            return Err(ConfigError::Invalid(format!(
                "starter {} is not a participant (0..{})",
                self.starter, self.participants
            )));
        }
        if self.genesis_amount == 0 {
            return Err(ConfigError::Invalid("genesis_amount cannot be 0".to_string()));
        }
        if self.gossip.filter_capacity == 0 {
            return Err(ConfigError::Invalid("filter_capacity cannot be 0".to_string()));
        }
        let rate = self.gossip.filter_error_rate;
        if !(rate > 0.0 && rate < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "filter_error_rate must be in (0, 1), got {rate}"
            )));
        }
        Ok(())
    }

    /// Load a config from a YAML file; missing fields take their defaults
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Parse a config from YAML text
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

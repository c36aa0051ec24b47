//! Configuration schema for the Knucklebones learning core.
//!
//! Every tunable threshold of the codec, the opponent engine and the training
//! pipeline lives here with a named default, so a YAML file only needs to list the
//! values it overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::labels::Difficulty;

/// Minimum arg-max output for a pattern label to be reported (else `unknown`).
pub const DEFAULT_LABEL_CONFIDENCE_GATE: f64 = 0.6;
/// Confidence deviation from the batch mean that flags a roll as anomalous.
pub const DEFAULT_ANOMALY_DEVIATION_GATE: f64 = 0.3;
/// Expected-value bonus per die of the same type already in the pool.
pub const DEFAULT_SYNERGY_BONUS: f64 = 0.1;
/// Expected-value penalty per pool group of a different type.
pub const DEFAULT_DIVERSITY_PENALTY: f64 = 0.05;

/// Configuration loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Network construction settings.
    #[serde(default)]
    pub network: NetworkConfig,
    /// Feature codec / analysis thresholds.
    #[serde(default)]
    pub codec: CodecConfig,
    /// Opponent decision engine tuning.
    #[serde(default)]
    pub opponent: OpponentConfig,
    /// Training pipeline settings.
    #[serde(default)]
    pub training: TrainingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    /// Seed for weight initialization.
    #[serde(default = "default_network_seed")]
    pub seed: u64,
    #[serde(default = "default_learning_rate")]
    pub pattern_learning_rate: f64,
    #[serde(default = "default_learning_rate")]
    pub move_learning_rate: f64,
}

fn default_network_seed() -> u64 {
    42
}

fn default_learning_rate() -> f64 {
    0.1
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            seed: default_network_seed(),
            pattern_learning_rate: default_learning_rate(),
            move_learning_rate: default_learning_rate(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CodecConfig {
    #[serde(default = "default_label_confidence_gate")]
    pub label_confidence_gate: f64,
    #[serde(default = "default_anomaly_deviation_gate")]
    pub anomaly_deviation_gate: f64,
}

fn default_label_confidence_gate() -> f64 {
    DEFAULT_LABEL_CONFIDENCE_GATE
}

fn default_anomaly_deviation_gate() -> f64 {
    DEFAULT_ANOMALY_DEVIATION_GATE
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            label_confidence_gate: default_label_confidence_gate(),
            anomaly_deviation_gate: default_anomaly_deviation_gate(),
        }
    }
}

/// Per-tier risk coefficient `k`: expected value gets `k * variance`.
///
/// Negative is risk-averse, positive is risk-seeking.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct RiskCoefficients {
    pub easy: f64,
    pub medium: f64,
    pub hard: f64,
    pub expert: f64,
}

impl Default for RiskCoefficients {
    fn default() -> Self {
        Self {
            easy: -0.15,
            medium: -0.05,
            hard: 0.0,
            expert: 0.05,
        }
    }
}

impl RiskCoefficients {
    pub fn for_difficulty(&self, d: Difficulty) -> f64 {
        match d {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
            Difficulty::Expert => self.expert,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpponentConfig {
    #[serde(default = "default_synergy_bonus")]
    pub synergy_bonus: f64,
    #[serde(default = "default_diversity_penalty")]
    pub diversity_penalty: f64,
    #[serde(default)]
    pub risk: RiskCoefficients,
    /// Rolls considered by the medium-tier history comparison.
    #[serde(default = "default_recent_window")]
    pub recent_window: usize,
    /// Hard+: confidence penalty on the human's most-rolled dice type.
    #[serde(default = "default_favored_penalty")]
    pub favored_penalty: f64,
    /// Hard+: bonus scale for exploiting a cautious human.
    #[serde(default = "default_exploit_bonus")]
    pub exploit_bonus: f64,
    /// Hard+: risk tolerance (mean dice per roll / 5) below which the human counts as cautious.
    #[serde(default = "default_low_risk_tolerance")]
    pub low_risk_tolerance: f64,
    /// Expert: bonus when the candidate beats the human's rolling average.
    #[serde(default = "default_rolling_bonus")]
    pub rolling_bonus: f64,
    /// Expert: penalty when it does not.
    #[serde(default = "default_rolling_penalty")]
    pub rolling_penalty: f64,
    /// Expert: penalty for opening a new group once the pool holds more than 3.
    #[serde(default = "default_complexity_penalty")]
    pub complexity_penalty: f64,
}

fn default_synergy_bonus() -> f64 {
    DEFAULT_SYNERGY_BONUS
}

fn default_diversity_penalty() -> f64 {
    DEFAULT_DIVERSITY_PENALTY
}

fn default_recent_window() -> usize {
    5
}

fn default_favored_penalty() -> f64 {
    0.15
}

fn default_exploit_bonus() -> f64 {
    0.1
}

fn default_low_risk_tolerance() -> f64 {
    0.4
}

fn default_rolling_bonus() -> f64 {
    0.1
}

fn default_rolling_penalty() -> f64 {
    0.05
}

fn default_complexity_penalty() -> f64 {
    0.1
}

impl Default for OpponentConfig {
    fn default() -> Self {
        Self {
            synergy_bonus: default_synergy_bonus(),
            diversity_penalty: default_diversity_penalty(),
            risk: RiskCoefficients::default(),
            recent_window: default_recent_window(),
            favored_penalty: default_favored_penalty(),
            exploit_bonus: default_exploit_bonus(),
            low_risk_tolerance: default_low_risk_tolerance(),
            rolling_bonus: default_rolling_bonus(),
            rolling_penalty: default_rolling_penalty(),
            complexity_penalty: default_complexity_penalty(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrainingConfig {
    /// Epochs per training run, applied to both networks.
    #[serde(default = "default_training_epochs")]
    pub epochs: u32,
    /// Number of most recent sessions used for the accuracy estimate.
    #[serde(default = "default_eval_sessions")]
    pub eval_sessions: usize,
    /// Where trained weights are persisted. None disables persistence.
    #[serde(default)]
    pub model_path: Option<String>,
    /// Optional NDJSON file receiving one event per training run.
    #[serde(default)]
    pub events_path: Option<String>,
}

fn default_training_epochs() -> u32 {
    100
}

fn default_eval_sessions() -> usize {
    10
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: default_training_epochs(),
            eval_sessions: default_eval_sessions(),
            model_path: None,
            events_path: None,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let bad = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        // network
        for lr in [
            self.network.pattern_learning_rate,
            self.network.move_learning_rate,
        ] {
            if !(lr.is_finite() && lr > 0.0) {
                return bad("network learning rates must be finite and > 0");
            }
        }

        // codec
        if !(0.0..=1.0).contains(&self.codec.label_confidence_gate) {
            return bad("codec.label_confidence_gate must be in [0,1]");
        }
        if !(0.0..=1.0).contains(&self.codec.anomaly_deviation_gate) {
            return bad("codec.anomaly_deviation_gate must be in [0,1]");
        }

        // opponent
        let o = &self.opponent;
        for (v, name) in [
            (o.synergy_bonus, "opponent.synergy_bonus"),
            (o.diversity_penalty, "opponent.diversity_penalty"),
            (o.favored_penalty, "opponent.favored_penalty"),
            (o.exploit_bonus, "opponent.exploit_bonus"),
            (o.rolling_bonus, "opponent.rolling_bonus"),
            (o.rolling_penalty, "opponent.rolling_penalty"),
            (o.complexity_penalty, "opponent.complexity_penalty"),
        ] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be finite and >= 0"
                )));
            }
        }
        let r = o.risk;
        if ![r.easy, r.medium, r.hard, r.expert]
            .iter()
            .all(|k| k.is_finite())
        {
            return bad("opponent.risk coefficients must be finite");
        }
        if o.recent_window < 1 {
            return bad("opponent.recent_window must be >= 1");
        }
        if !(0.0..=1.0).contains(&o.low_risk_tolerance) {
            return bad("opponent.low_risk_tolerance must be in [0,1]");
        }

        // training
        if self.training.epochs < 1 {
            return bad("training.epochs must be >= 1");
        }
        if self.training.eval_sessions < 1 {
            return bad("training.eval_sessions must be >= 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_default_yaml() {
        // Load the config file shipped with the repo
        let config =
            Config::load("../configs/default.yaml").expect("Failed to load configs/default.yaml");

        assert_eq!(config.codec.label_confidence_gate, 0.6);
        assert_eq!(config.codec.anomaly_deviation_gate, 0.3);
        assert_eq!(config.opponent.synergy_bonus, 0.1);
        assert_eq!(config.opponent.diversity_penalty, 0.05);
        assert_eq!(config.opponent.risk.hard, 0.0);
        assert_eq!(config.training.epochs, 100);
        assert_eq!(config.training.eval_sessions, 10);
    }

    #[test]
    fn test_parse_partial_yaml_applies_defaults() {
        let yaml = r#"
network:
  seed: 7
opponent:
  risk:
    easy: -0.3
    medium: -0.1
    hard: 0.0
    expert: 0.2
training:
  epochs: 5
  model_path: "models/kb.safetensors"
"#;

        let config = Config::from_yaml(yaml).expect("Failed to parse YAML");
        assert_eq!(config.network.seed, 7);
        assert_eq!(config.network.pattern_learning_rate, 0.1);
        assert_eq!(config.opponent.risk.expert, 0.2);
        assert_eq!(config.opponent.synergy_bonus, DEFAULT_SYNERGY_BONUS);
        assert_eq!(config.training.epochs, 5);
        assert_eq!(config.training.eval_sessions, 10);
        assert_eq!(
            config.training.model_path.as_deref(),
            Some("models/kb.safetensors")
        );
        assert_eq!(
            config.codec.label_confidence_gate,
            DEFAULT_LABEL_CONFIDENCE_GATE
        );
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config.training.epochs, 100);
        assert!(config.training.model_path.is_none());
    }

    #[test]
    fn test_invalid_yaml_fails() {
        let invalid_yaml = "this is not: valid: yaml: {{{}}}";
        let result = Config::from_yaml(invalid_yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_out_of_range_gate_is_rejected() {
        let yaml = "codec:\n  label_confidence_gate: 1.5\n";
        match Config::from_yaml(yaml) {
            Err(ConfigError::Invalid(msg)) => assert!(msg.contains("label_confidence_gate")),
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_epochs_is_rejected() {
        let mut cfg = Config::default();
        cfg.training.epochs = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }
}

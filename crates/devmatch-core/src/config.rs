//! Configuration for devmatch
//!
//! Centralized settings for blocking, model training and candidate scoring.
//! Every section has defaults, so a config file only needs the keys it
//! changes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::blocking::{KeySchema, SchemaPolicy, DEFAULT_COMMON_DOMAINS, GITHUB_NOREPLY_DOMAIN};
use crate::error::{DevmatchError, Result};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DevmatchConfig {
    /// Candidate generation settings
    pub blocking: BlockingConfig,
    /// Logistic model training settings
    pub training: TrainingConfig,
    /// Candidate filtering after scoring
    pub scoring: ScoringConfig,
}

/// Candidate generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockingConfig {
    /// Buckets larger than this are skipped entirely
    pub max_bucket_size: usize,
    /// Blank the domain segment for common providers
    pub ignore_common_domains: bool,
    /// Providers treated as non-discriminative
    pub common_domains: Vec<String>,
    /// Domain whose local parts carry a GitHub handle after `+`
    pub noreply_domain: String,
    /// Key schemas for `merge_candidates`, in claim order
    pub passes: Vec<Vec<String>>,
    /// Handling of unrecognized component names in `passes`
    pub unknown_components: SchemaPolicy,
}

impl Default for BlockingConfig {
    fn default() -> Self {
        Self {
            max_bucket_size: 1000,
            ignore_common_domains: true,
            common_domains: DEFAULT_COMMON_DOMAINS.iter().map(|d| d.to_string()).collect(),
            noreply_domain: GITHUB_NOREPLY_DOMAIN.to_string(),
            passes: KeySchema::default_passes()
                .iter()
                .map(|schema| schema.names().iter().map(|n| n.to_string()).collect())
                .collect(),
            unknown_components: SchemaPolicy::Lenient,
        }
    }
}

impl BlockingConfig {
    /// Parse `passes` into key schemas under `unknown_components`
    pub fn key_schemas(&self) -> Result<Vec<KeySchema>> {
        self.passes
            .iter()
            .map(|names| KeySchema::parse(names, self.unknown_components))
            .collect()
    }
}

/// Logistic regression training configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Fraction of each class held out for evaluation
    pub test_size: f64,
    /// Maximum gradient descent iterations
    pub max_iter: usize,
    /// Gradient descent step size
    pub learning_rate: f64,
    /// Inverse L2 regularization strength
    pub c: f64,
    /// Stop when the largest gradient component drops below this
    pub tolerance: f64,
    /// Reweight classes inversely to their frequency
    pub balanced: bool,
    /// Decision threshold used for the evaluation report
    pub report_threshold: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_size: 0.25,
            max_iter: 2000,
            learning_rate: 1.0,
            c: 1.0,
            tolerance: 1e-6,
            balanced: true,
            report_threshold: 0.916,
        }
    }
}

/// Filtering applied to scored candidates
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Keep rows with probability >= threshold
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    /// Keep the k most probable rows (takes precedence over threshold)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,
}

impl DevmatchConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self> {
        Ok(serde_json::from_str(json_str)?)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load and validate a config file; `.json` files are read as JSON,
    /// anything else as TOML
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content)?,
            _ => Self::from_toml(&content)?,
        };
        config.validate()?;
        tracing::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.blocking.max_bucket_size < 2 {
            return Err(DevmatchError::InvalidConfig(
                "blocking.max_bucket_size must be at least 2".to_string(),
            ));
        }

        if self.blocking.passes.is_empty() {
            return Err(DevmatchError::InvalidConfig(
                "blocking.passes must name at least one key schema".to_string(),
            ));
        }

        self.blocking.key_schemas()?;

        if !(self.training.test_size > 0.0 && self.training.test_size < 1.0) {
            return Err(DevmatchError::InvalidConfig(
                "training.test_size must be between 0.0 and 1.0 (exclusive)".to_string(),
            ));
        }

        if self.training.c <= 0.0 || self.training.learning_rate <= 0.0 {
            return Err(DevmatchError::InvalidConfig(
                "training.c and training.learning_rate must be positive".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.training.report_threshold) {
            return Err(DevmatchError::InvalidConfig(
                "training.report_threshold must be between 0.0 and 1.0".to_string(),
            ));
        }

        if let Some(threshold) = self.scoring.threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(DevmatchError::InvalidConfig(
                    "scoring.threshold must be between 0.0 and 1.0".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DevmatchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.blocking.passes.len(), 4);
        assert_eq!(config.blocking.passes[0], vec!["domain", "lastname_initial"]);
        assert_eq!(config.blocking.common_domains.len(), 14);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = DevmatchConfig::from_toml(
            r#"
            [blocking]
            max_bucket_size = 50

            [scoring]
            threshold = 0.65
            "#,
        )
        .unwrap();
        assert_eq!(config.blocking.max_bucket_size, 50);
        assert!(config.blocking.ignore_common_domains);
        assert_eq!(config.scoring.threshold, Some(0.65));
        assert_eq!(config.training.max_iter, 2000);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = DevmatchConfig::default();
        let toml_str = config.to_toml().unwrap();
        let parsed = DevmatchConfig::from_toml(&toml_str).unwrap();
        assert_eq!(parsed.blocking.passes, config.blocking.passes);
        assert_eq!(parsed.training.report_threshold, config.training.report_threshold);
    }

    #[test]
    fn test_json_serialization() {
        let config = DevmatchConfig::default();
        let json = config.to_json().unwrap();
        let parsed = DevmatchConfig::from_json(&json).unwrap();
        assert_eq!(parsed.blocking.max_bucket_size, 1000);
    }

    #[test]
    fn test_strict_policy_rejects_typo() {
        let mut config = DevmatchConfig::default();
        config.blocking.passes.push(vec!["lastname_inital".to_string()]);
        assert!(config.validate().is_ok());

        config.blocking.unknown_components = SchemaPolicy::Strict;
        assert!(matches!(
            config.validate(),
            Err(DevmatchError::UnknownKeyComponent(_))
        ));
    }

    #[test]
    fn test_out_of_range() {
        let mut config = DevmatchConfig::default();
        config.training.test_size = 1.5;
        assert!(config.validate().is_err());

        let mut config = DevmatchConfig::default();
        config.scoring.threshold = Some(-0.1);
        assert!(config.validate().is_err());

        let mut config = DevmatchConfig::default();
        config.blocking.max_bucket_size = 1;
        assert!(config.validate().is_err());
    }
}

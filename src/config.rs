//! Configuration management for the churn prediction service

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// How out-of-range form values are treated before bucketing.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RangePolicy {
    /// Bucket anything; tenure above 72 lands in "61-72" (logged)
    #[default]
    Lenient,
    /// Reject tenure outside 0..=72 and negative charges
    Strict,
}

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub model: ModelConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject prediction requests arrive on
    #[serde(default = "default_request_subject")]
    pub request_subject: String,
}

fn default_request_subject() -> String {
    "churn.predict".to_string()
}

/// Classifier artifact configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Classifier artifact (`.onnx` or logistic `.json`)
    pub artifact_path: PathBuf,
    /// Optional JSON schema sidecar; the built-in telco schema otherwise
    #[serde(default)]
    pub schema_path: Option<PathBuf>,
    /// Decision threshold on the class-1 probability
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_threshold() -> f64 {
    crate::models::inference::DEFAULT_THRESHOLD
}

fn default_onnx_threads() -> usize {
    1
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            artifact_path: PathBuf::from("models/churn_classifier.onnx"),
            schema_path: None,
            threshold: default_threshold(),
            onnx_threads: default_onnx_threads(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ValidationConfig {
    #[serde(default)]
    pub range_policy: RangePolicy,
}

/// Request handling configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Maximum requests handled concurrently
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Echo the normalized record back in replies
    #[serde(default = "default_include_features")]
    pub include_features: bool,
}

fn default_workers() -> usize {
    4
}

fn default_include_features() -> bool {
    true
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            include_features: default_include_features(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file plus `CHURN__*` overrides
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path plus `CHURN__*` overrides
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix("CHURN").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no request could be served with
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.model.threshold) {
            bail!(
                "model.threshold must be within [0, 1], got {}",
                self.model.threshold
            );
        }
        if self.service.workers == 0 {
            bail!("service.workers must be at least 1");
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                request_subject: default_request_subject(),
            },
            model: ModelConfig::default(),
            validation: ValidationConfig::default(),
            service: ServiceConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

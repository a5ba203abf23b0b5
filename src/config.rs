//! Configuration management for the prediction service

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Prefix for environment overrides, e.g. `DEPOSIT_API__SERVER__PORT`
pub const ENV_PREFIX: &str = "DEPOSIT_API";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to
    pub host: String,
    /// Port to listen on for the lifetime of the process
    pub port: u16,
    /// Number of actix workers (0 = one per CPU)
    pub workers: usize,
    /// Maximum accepted JSON body size
    pub json_limit_bytes: usize,
}

/// Model artifact configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path to the serialized model artifact
    pub path: PathBuf,
    /// Overrides the decision threshold stored in the artifact
    #[serde(default)]
    pub threshold: Option<f64>,
    /// Number of intra-op threads for ONNX estimators
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_onnx_threads() -> usize {
    1
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl AppConfig {
    /// Load configuration from the default file and the environment.
    ///
    /// The default file is optional; when absent the built-in defaults apply.
    pub fn load() -> Result<Self> {
        Self::load_layers(Path::new(DEFAULT_CONFIG_PATH), false)
    }

    /// Load configuration from an explicitly named file, which must exist
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_layers(path.as_ref(), true)
    }

    /// Layer defaults < file < environment
    fn load_layers(path: &Path, required: bool) -> Result<Self> {
        let defaults = Config::try_from(&AppConfig::default())
            .context("Failed to encode default configuration")?;

        let config = Config::builder()
            .add_source(defaults)
            .add_source(File::from(path).required(required))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to build configuration from {}", path.display()))?;

        let config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the server cannot start with
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            bail!("server.port must be non-zero");
        }
        if self.server.json_limit_bytes == 0 {
            bail!("server.json_limit_bytes must be non-zero");
        }
        if self.model.path.as_os_str().is_empty() {
            bail!("model.path must not be empty");
        }
        if let Some(threshold) = self.model.threshold {
            if !(0.0..=1.0).contains(&threshold) {
                bail!("model.threshold must be within [0, 1], got {}", threshold);
            }
        }
        if self.model.onnx_threads == 0 {
            bail!("model.onnx_threads must be at least 1");
        }
        Ok(())
    }

    /// Socket address string the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                workers: 0,
                json_limit_bytes: 64 * 1024,
            },
            model: ModelConfig {
                path: PathBuf::from("models/rf_pipeline.json"),
                threshold: None,
                onnx_threads: 1,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Pretty,
            },
        }
    }
}

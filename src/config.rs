use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Model artifact configuration
    #[serde(default)]
    pub models: ModelsConfig,

    /// Training defaults
    #[serde(default)]
    pub training: TrainingConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the embedded defaults, an optional file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path = std::env::var("OUTBREAK_CONFIG")
            .unwrap_or_else(|_| "config/outbreak.toml".to_string());

        Self::load_from(&config_path)
    }

    /// Load configuration, overriding the defaults with the file at `config_path` if it exists
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            .add_source(config::File::with_name(config_path).required(false))
            // Override with environment variables (prefix: OUTBREAK_)
            .add_source(
                config::Environment::with_prefix("OUTBREAK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Directory holding model, scaler and metadata artifacts
    #[serde(default = "default_models_dir")]
    pub dir: PathBuf,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            dir: default_models_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Held-out fraction used when the caller does not supply one
    #[serde(default = "default_test_size")]
    pub test_size: f64,

    /// Seed used when the caller does not supply one
    #[serde(default = "default_random_seed")]
    pub random_seed: u64,

    /// Below this many observations training still runs but logs a warning
    #[serde(default = "default_min_samples_warning")]
    pub min_samples_warning: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_size: default_test_size(),
            random_seed: default_random_seed(),
            min_samples_warning: default_min_samples_warning(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log filter used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

fn default_models_dir() -> PathBuf {
    PathBuf::from("./data/models")
}

fn default_test_size() -> f64 {
    0.2
}

fn default_random_seed() -> u64 {
    42
}

fn default_min_samples_warning() -> usize {
    10
}

fn default_log_level() -> String {
    "outbreak_predictor=info".to_string()
}

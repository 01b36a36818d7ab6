//! Configuration management for `pmcast`
//!
//! Handles loading configuration from a TOML file and environment variables,
//! and provides validation for all configuration settings.

use crate::PmcastError;
use crate::features::{Conditions, DEFAULT_LAG_SEED, FeaturePrep};
use crate::models::Pollutant;
use crate::presenter::ChartKind;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "PMCAST_CONFIG";

/// Root configuration structure for `pmcast`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PmcastConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Page presentation settings
    #[serde(default)]
    pub dashboard: DashboardConfig,
    /// Placeholder humidity/temperature for the forecast window
    #[serde(default)]
    pub conditions: Conditions,
    /// One entry per forecast pollutant, in display order
    #[serde(default = "default_pollutants")]
    pub pollutants: Vec<PollutantConfig>,
}

/// HTTP server configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u32,
    /// Largest accepted upload body in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Directory served under `/assets`
    #[serde(default = "default_assets_dir")]
    pub assets_dir: String,
    /// PEM certificate; TLS is enabled when both paths are set
    pub tls_cert_path: Option<String>,
    /// PEM private key
    pub tls_key_path: Option<String>,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// OTLP/HTTP endpoint for trace export, disabled when unset
    pub otlp_endpoint: Option<String>,
}

/// Page presentation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Page heading
    #[serde(default = "default_title")]
    pub title: String,
    /// Bar or line chart
    #[serde(default)]
    pub chart_kind: ChartKind,
}

/// Model and feature settings for one pollutant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollutantConfig {
    pub pollutant: Pollutant,
    /// Serialized model file
    pub model_path: String,
    /// Feature preparation the model was trained with
    #[serde(default)]
    pub features: FeaturePrep,
    /// Target history lag features are derived from
    #[serde(default = "default_lag_seed")]
    pub lag_seed: Vec<f64>,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8050
}

fn default_request_timeout() -> u32 {
    30
}

fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_assets_dir() -> String {
    "assets".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_title() -> String {
    "PM Forecast".to_string()
}

fn default_lag_seed() -> Vec<f64> {
    DEFAULT_LAG_SEED.to_vec()
}

fn default_pollutants() -> Vec<PollutantConfig> {
    vec![PollutantConfig {
        pollutant: Pollutant::Pm10,
        model_path: "models/pm10.json".to_string(),
        features: FeaturePrep::Calendar,
        lag_seed: default_lag_seed(),
    }]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
            max_upload_bytes: default_max_upload_bytes(),
            assets_dir: default_assets_dir(),
            tls_cert_path: None,
            tls_key_path: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            otlp_endpoint: None,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            chart_kind: ChartKind::default(),
        }
    }
}

impl Default for PmcastConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            dashboard: DashboardConfig::default(),
            conditions: Conditions::default(),
            pollutants: default_pollutants(),
        }
    }
}

impl ServerConfig {
    /// Address string for the listener
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl PmcastConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(Self::get_config_path);

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // PMCAST__SERVER__PORT=9000 overrides server.port
        builder = builder.add_source(
            Environment::with_prefix("PMCAST")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: PmcastConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Configuration file from `PMCAST_CONFIG`, else `pmcast.toml` in the working directory
    #[must_use]
    pub fn get_config_path() -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("pmcast.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.server.host.is_empty() {
            self.server.host = default_host();
        }
        if self.server.request_timeout_seconds == 0 {
            self.server.request_timeout_seconds = default_request_timeout();
        }
        if self.server.max_upload_bytes == 0 {
            self.server.max_upload_bytes = default_max_upload_bytes();
        }
        if self.server.assets_dir.is_empty() {
            self.server.assets_dir = default_assets_dir();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.dashboard.title.is_empty() {
            self.dashboard.title = default_title();
        }
        if self.pollutants.is_empty() {
            self.pollutants = default_pollutants();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        self.validate_forecast()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(PmcastError::config("Server port cannot be 0").into());
        }

        if self.server.request_timeout_seconds > 300 {
            return Err(PmcastError::config("Request timeout cannot exceed 300 seconds").into());
        }

        if self.server.max_upload_bytes > 100 * 1024 * 1024 {
            return Err(
                PmcastError::config("Upload size limit cannot exceed 100 MiB").into(),
            );
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(PmcastError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(PmcastError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if let Some(endpoint) = &self.logging.otlp_endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(PmcastError::config(
                    "OTLP endpoint must be a valid HTTP or HTTPS URL",
                )
                .into());
            }
        }

        if self.server.tls_cert_path.is_some() != self.server.tls_key_path.is_some() {
            return Err(PmcastError::config(
                "tls_cert_path and tls_key_path must be set together",
            )
            .into());
        }

        Ok(())
    }

    /// Validate conditions and the pollutant list
    fn validate_forecast(&self) -> Result<()> {
        self.conditions.validate()?;

        let mut seen = HashSet::new();
        for entry in &self.pollutants {
            if !seen.insert(entry.pollutant) {
                return Err(PmcastError::config(format!(
                    "Pollutant {} is configured more than once",
                    entry.pollutant
                ))
                .into());
            }
            if entry.model_path.trim().is_empty() {
                return Err(PmcastError::config(format!(
                    "Model path for {} cannot be empty",
                    entry.pollutant
                ))
                .into());
            }
            entry.features.validate()?;
            entry.features.check_seed(&entry.lag_seed)?;
        }

        Ok(())
    }
}

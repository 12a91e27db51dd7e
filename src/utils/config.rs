//! Configuration management
//!
//! This module handles loading and managing configuration.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::timestamps::Freq;
use crate::pipeline::PipelineConfig;

/// Input data configuration: column roles within the table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub timestamp_column: Option<String>,
    pub id_columns: Vec<String>,
    pub target_columns: Vec<String>,
    pub observable_columns: Vec<String>,
    pub control_columns: Vec<String>,
    pub conditional_columns: Vec<String>,
    pub static_categorical_columns: Vec<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            timestamp_column: Some("timestamp".to_string()),
            id_columns: Vec::new(),
            target_columns: Vec::new(),
            observable_columns: Vec::new(),
            control_columns: Vec::new(),
            conditional_columns: Vec::new(),
            static_categorical_columns: Vec::new(),
        }
    }
}

/// Forecast geometry and output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    pub context_length: usize,
    pub prediction_length: usize,
    pub fill_value: f64,
    pub explode_forecasts: bool,
    pub freq: Option<String>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            context_length: 64,
            prediction_length: 16,
            fill_value: 0.0,
            explode_forecasts: false,
            freq: None,
        }
    }
}

/// Model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model kind, `seasonal_naive` or `linear`
    pub kind: String,
    pub season_length: usize,
    pub ridge: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            kind: "seasonal_naive".to_string(),
            season_length: 1,
            ridge: 1e-6,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub data: DataConfig,
    pub forecast: ForecastConfig,
    pub model: ModelConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from file or use default
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Create default configuration file
    pub fn create_default<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Config::default();
        config.save(path)
    }

    /// Build the pipeline configuration these settings describe
    pub fn to_pipeline_config(&self) -> crate::error::Result<PipelineConfig> {
        let freq = match &self.forecast.freq {
            Some(s) => Some(Freq::parse(s)?),
            None => None,
        };
        let mut config = PipelineConfig::new()
            .with_id_columns(self.data.id_columns.clone())
            .with_target_columns(self.data.target_columns.clone())
            .with_observable_columns(self.data.observable_columns.clone())
            .with_control_columns(self.data.control_columns.clone())
            .with_conditional_columns(self.data.conditional_columns.clone())
            .with_static_categorical_columns(self.data.static_categorical_columns.clone())
            .with_context_length(self.forecast.context_length)
            .with_prediction_length(self.forecast.prediction_length)
            .with_explode_forecasts(self.forecast.explode_forecasts)
            .with_fill_value(self.forecast.fill_value);
        if let Some(name) = &self.data.timestamp_column {
            config = config.with_timestamp_column(name.clone());
        }
        config.freq = freq;
        Ok(config)
    }
}

//! Utility module
//!
//! This module provides:
//! - Configuration management
//! - Logging setup
//! - Forecast accuracy metrics

mod config;
mod logging;
mod metrics;

pub use config::{Config, DataConfig, ForecastConfig, LoggingConfig, ModelConfig};
pub use logging::setup_logging;
pub use metrics::{forecast_metrics, mae, mape, mse, rmse, smape, ForecastMetrics};

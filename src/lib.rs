//! # ts-forecast
//!
//! Inference pipeline for multivariate time series forecasting over tabular
//! data.
//!
//! ## Features
//!
//! - Columnar time series frames with CSV input and output
//! - Per-series sliding windows with observed-value masks
//! - A model seam that hands each model only the batch fields it asks for
//! - Forecast tables keyed by timestamp and series identifiers, as
//!   list-valued rows or exploded one row per horizon step
//!
//! ## Modules
//!
//! - `data` - frames, timestamps, windowing, and batches
//! - `model` - the `ForecastModel` trait and reference models
//! - `pipeline` - preprocess, forward, and postprocess stages
//! - `utils` - configuration, logging, and accuracy metrics
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use ts_forecast::{ForecastingPipeline, PipelineConfig, SeasonalNaiveModel};
//!
//! fn main() -> anyhow::Result<()> {
//!     let model = SeasonalNaiveModel::new(64, 16, 24)?;
//!     let config = PipelineConfig::new()
//!         .with_timestamp_column("timestamp")
//!         .with_target_columns(vec!["close".to_string()]);
//!     let pipeline = ForecastingPipeline::new(model, config)?;
//!
//!     let forecasts = pipeline.forecast(Path::new("data/prices.csv"))?;
//!     forecasts.write_csv("forecasts.csv")?;
//!     Ok(())
//! }
//! ```

pub mod data;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod utils;

// Re-exports for convenience
pub use data::{
    Batch, BatchValue, Cell, Column, DatasetConfig, ForecastDataset, Freq, TimeSeriesFrame,
    Timestamp,
};
pub use error::{Error, Result};
pub use model::{ForecastModel, LinearModel, SeasonalNaiveModel};
pub use pipeline::{ForecastingPipeline, PipelineConfig, TableSource};
pub use utils::{setup_logging, Config};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Forecasting inference pipeline
//!
//! This module provides the preprocess, forward, and postprocess stages
//! that turn a raw table and a model into a forecast table.

mod forecasting;

pub use forecasting::{ForecastingPipeline, PipelineConfig, TableSource};

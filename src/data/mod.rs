//! Time series data handling
//!
//! This module provides functionality for:
//! - Columnar frames with CSV input/output
//! - Timestamp, frequency, and horizon arithmetic
//! - Cutting frames into sliding windows and stacking batches

pub mod batch;
pub mod dataset;
pub mod frame;
pub mod timestamps;

pub use batch::{Batch, BatchValue};
pub use dataset::{DatasetConfig, ForecastDataset};
pub use frame::{Cell, Column, RowGroup, TimeSeriesFrame};
pub use timestamps::{
    create_timestamps, extend_time_series, infer_freq, Freq, Timestamp,
};

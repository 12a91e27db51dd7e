//! Error types for the forecasting pipeline library

use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// A named column is missing from a frame
    #[error("column not found: {0}")]
    ColumnNotFound(String),

    /// A column did not have the expected length
    #[error("column '{column}' has {actual} rows, expected {expected}")]
    ColumnLengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// A value or column had an incompatible type
    #[error("column '{column}': {details}")]
    ColumnTypeMismatch { column: String, details: String },

    /// The future time series referenced a column the base series lacks
    #[error("future time series input contains an unknown column '{0}'")]
    UnknownFutureColumn(String),

    /// A timestamp string could not be parsed
    #[error("failed to parse timestamp '{0}'")]
    TimestampParse(String),

    /// An invalid or unusable frequency
    #[error("invalid frequency: {0}")]
    InvalidFrequency(String),

    /// Not enough rows to build at least one window
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// A batch was missing a required field
    #[error("missing batch field: {0}")]
    MissingBatchField(String),

    /// A batch field held a different kind of value than requested
    #[error("batch field '{field}' is {actual}, expected {expected}")]
    BatchFieldKind {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A tensor had an unexpected shape
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Invalid pipeline or dataset configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// CSV read/write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

//! Named batches exchanged between the dataset, the model, and the pipeline

use ndarray::{ArrayD, ArrayView3, Ix3};

use crate::data::frame::Cell;
use crate::data::timestamps::Timestamp;
use crate::error::{Error, Result};

/// Batch field holding the context window values, `(batch, context, channels)`
pub const PAST_VALUES: &str = "past_values";
/// Batch field masking observed context values, 1.0 observed / 0.0 missing
pub const PAST_OBSERVED_MASK: &str = "past_observed_mask";
/// Batch field holding the horizon target values, `(batch, prediction, targets)`
pub const FUTURE_VALUES: &str = "future_values";
/// Batch field masking observed horizon values
pub const FUTURE_OBSERVED_MASK: &str = "future_observed_mask";
/// Batch field holding encoded static categorical values per window
pub const STATIC_CATEGORICAL_VALUES: &str = "static_categorical_values";
/// Batch field holding the forecast origin timestamp of each window
pub const TIMESTAMP: &str = "timestamp";
/// Batch field holding the identifier tuple of each window
pub const ID: &str = "id";
/// Model output field holding point forecasts
pub const PREDICTION_OUTPUTS: &str = "prediction_outputs";
/// Model output field holding raw forecast scores
pub const PREDICTION_LOGITS: &str = "prediction_logits";

/// One value inside a batch
#[derive(Debug, Clone, PartialEq)]
pub enum BatchValue {
    /// Stacked numeric data
    Tensor(ArrayD<f64>),
    /// One timestamp per window
    Timestamps(Vec<Timestamp>),
    /// One identifier tuple per window
    Ids(Vec<Vec<Cell>>),
}

impl BatchValue {
    /// Short name of the value's kind, for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            BatchValue::Tensor(_) => "tensor",
            BatchValue::Timestamps(_) => "timestamps",
            BatchValue::Ids(_) => "ids",
        }
    }
}

/// An ordered collection of named batch fields
///
/// Insertion order is preserved so output tables keep a stable column
/// layout; inserting an existing name replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    fields: Vec<(String, BatchValue)>,
}

impl Batch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the batch has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether a field exists
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| n == name)
    }

    /// Insert a field, replacing any existing value under the same name
    pub fn insert(&mut self, name: impl Into<String>, value: BatchValue) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Field by name
    pub fn get(&self, name: &str) -> Option<&BatchValue> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Tensor field by name, failing on absent or differently-typed fields
    pub fn tensor(&self, name: &str) -> Result<&ArrayD<f64>> {
        match self.get(name) {
            Some(BatchValue::Tensor(t)) => Ok(t),
            Some(other) => Err(Error::BatchFieldKind {
                field: name.to_string(),
                expected: "tensor",
                actual: other.kind_name(),
            }),
            None => Err(Error::MissingBatchField(name.to_string())),
        }
    }

    /// Tensor field by name, viewed as `(batch, steps, channels)`
    pub fn tensor3(&self, name: &str) -> Result<ArrayView3<'_, f64>> {
        let tensor = self.tensor(name)?;
        tensor.view().into_dimensionality::<Ix3>().map_err(|_| {
            Error::ShapeMismatch(format!(
                "batch field '{name}' must have shape (batch, steps, channels), got {:?}",
                tensor.shape()
            ))
        })
    }

    /// Timestamp field by name
    pub fn timestamps(&self, name: &str) -> Result<&[Timestamp]> {
        match self.get(name) {
            Some(BatchValue::Timestamps(t)) => Ok(t),
            Some(other) => Err(Error::BatchFieldKind {
                field: name.to_string(),
                expected: "timestamps",
                actual: other.kind_name(),
            }),
            None => Err(Error::MissingBatchField(name.to_string())),
        }
    }

    /// Identifier field by name
    pub fn ids(&self, name: &str) -> Result<&[Vec<Cell>]> {
        match self.get(name) {
            Some(BatchValue::Ids(t)) => Ok(t),
            Some(other) => Err(Error::BatchFieldKind {
                field: name.to_string(),
                expected: "ids",
                actual: other.kind_name(),
            }),
            None => Err(Error::MissingBatchField(name.to_string())),
        }
    }

    /// Iterate fields in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BatchValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Field names in insertion order
    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|(n, _)| n.as_str()).collect()
    }
}

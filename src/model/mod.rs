//! Forecasting models
//!
//! This module provides functionality for:
//! - The `ForecastModel` trait the pipeline drives models through
//! - A seasonal naive baseline
//! - A ridge-regularized linear autoregressor

mod linear;
mod naive;

pub use linear::LinearModel;
pub use naive::SeasonalNaiveModel;

use crate::data::Batch;
use crate::error::Result;

/// A model the forecasting pipeline can run
///
/// The pipeline hands a model only the batch fields it names in
/// `input_names`, so models stay unaware of bookkeeping fields such as
/// window timestamps and identifiers.
pub trait ForecastModel {
    /// Batch fields the model consumes
    fn input_names(&self) -> Vec<String>;

    /// Context length the model was built for, when it has one
    fn context_length(&self) -> Option<usize> {
        None
    }

    /// Horizon length the model was built for, when it has one
    fn prediction_length(&self) -> Option<usize> {
        None
    }

    /// Produce forecasts for a batch of windows
    ///
    /// Returns a batch whose `prediction_outputs` tensor has shape
    /// `(batch, prediction, channels)`; target channels come first.
    fn forward(&self, inputs: &Batch) -> Result<Batch>;
}

impl<M: ForecastModel + ?Sized> ForecastModel for Box<M> {
    fn input_names(&self) -> Vec<String> {
        (**self).input_names()
    }

    fn context_length(&self) -> Option<usize> {
        (**self).context_length()
    }

    fn prediction_length(&self) -> Option<usize> {
        (**self).prediction_length()
    }

    fn forward(&self, inputs: &Batch) -> Result<Batch> {
        (**self).forward(inputs)
    }
}

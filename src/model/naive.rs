//! Seasonal naive baseline

use ndarray::Array3;

use crate::data::batch::{self, Batch, BatchValue};
use crate::error::{Error, Result};
use crate::model::ForecastModel;

/// Repeats the last observed season across the horizon
///
/// With a season length of 1 this degrades to a last-value carry-forward.
/// Useful as a zero-shot baseline and as a reference point for trained
/// models.
#[derive(Debug, Clone)]
pub struct SeasonalNaiveModel {
    context_length: usize,
    prediction_length: usize,
    season_length: usize,
}

impl SeasonalNaiveModel {
    /// Create a baseline for the given window geometry
    pub fn new(
        context_length: usize,
        prediction_length: usize,
        season_length: usize,
    ) -> Result<Self> {
        if season_length == 0 || season_length > context_length {
            return Err(Error::InvalidConfig(format!(
                "season length {season_length} must be between 1 and the context length {context_length}"
            )));
        }
        Ok(Self {
            context_length,
            prediction_length,
            season_length,
        })
    }
}

impl ForecastModel for SeasonalNaiveModel {
    fn input_names(&self) -> Vec<String> {
        vec![batch::PAST_VALUES.to_string()]
    }

    fn context_length(&self) -> Option<usize> {
        Some(self.context_length)
    }

    fn prediction_length(&self) -> Option<usize> {
        Some(self.prediction_length)
    }

    fn forward(&self, inputs: &Batch) -> Result<Batch> {
        let past = inputs.tensor3(batch::PAST_VALUES)?;
        let (b, context, channels) = past.dim();
        if context != self.context_length {
            return Err(Error::ShapeMismatch(format!(
                "expected context length {}, got {context}",
                self.context_length
            )));
        }

        let mut prediction = Array3::<f64>::zeros((b, self.prediction_length, channels));
        let season_start = context - self.season_length;
        for w in 0..b {
            for t in 0..self.prediction_length {
                let source = season_start + t % self.season_length;
                for c in 0..channels {
                    prediction[[w, t, c]] = past[[w, source, c]];
                }
            }
        }

        let mut out = Batch::new();
        out.insert(
            batch::PREDICTION_OUTPUTS,
            BatchValue::Tensor(prediction.into_dyn()),
        );
        Ok(out)
    }
}

//! End-to-end forecasting over tabular time series

use std::borrow::Cow;
use std::path::Path;

use ndarray::ArrayView3;
use tracing::debug;

use crate::data::batch::{self, Batch};
use crate::data::dataset::{DatasetConfig, ForecastDataset};
use crate::data::frame::{Cell, Column, TimeSeriesFrame};
use crate::data::timestamps::{create_timestamps, extend_time_series, Freq, Timestamp};
use crate::error::{Error, Result};
use crate::model::ForecastModel;

/// Input accepted by the pipeline, either in memory or on disk
#[derive(Debug, Clone, Copy)]
pub enum TableSource<'a> {
    /// An already-loaded frame
    Frame(&'a TimeSeriesFrame),
    /// Path to a CSV file with a header row
    Csv(&'a Path),
}

impl<'a> From<&'a TimeSeriesFrame> for TableSource<'a> {
    fn from(frame: &'a TimeSeriesFrame) -> Self {
        TableSource::Frame(frame)
    }
}

impl<'a> From<&'a Path> for TableSource<'a> {
    fn from(path: &'a Path) -> Self {
        TableSource::Csv(path)
    }
}

/// Column roles and forecast options for a pipeline
///
/// Context and prediction lengths left unset are taken from the model.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Name of the timestamp column, when the data has one
    pub timestamp_column: Option<String>,
    /// Columns identifying separate series within the frame
    pub id_columns: Vec<String>,
    /// Columns to forecast
    pub target_columns: Vec<String>,
    /// Measured channels that are never known in advance
    pub observable_columns: Vec<String>,
    /// Channels whose future values are known or chosen
    pub control_columns: Vec<String>,
    /// Channels given as context only
    pub conditional_columns: Vec<String>,
    /// Per-series constant columns; string values are encoded to codes
    pub static_categorical_columns: Vec<String>,
    /// Context rows per window, defaulting to the model's value
    pub context_length: Option<usize>,
    /// Horizon rows per window, defaulting to the model's value
    pub prediction_length: Option<usize>,
    /// Spacing of generated horizon timestamps
    pub freq: Option<Freq>,
    /// Emit one row per horizon step instead of one row per window
    pub explode_forecasts: bool,
    /// Replacement for missing values in the value tensors
    pub fill_value: f64,
}

impl PipelineConfig {
    /// Create an empty config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the timestamp column
    pub fn with_timestamp_column(mut self, name: impl Into<String>) -> Self {
        self.timestamp_column = Some(name.into());
        self
    }

    /// Set the identifier columns
    pub fn with_id_columns(mut self, names: Vec<String>) -> Self {
        self.id_columns = names;
        self
    }

    /// Set the target columns
    pub fn with_target_columns(mut self, names: Vec<String>) -> Self {
        self.target_columns = names;
        self
    }

    /// Set the observable columns
    pub fn with_observable_columns(mut self, names: Vec<String>) -> Self {
        self.observable_columns = names;
        self
    }

    /// Set the control columns
    pub fn with_control_columns(mut self, names: Vec<String>) -> Self {
        self.control_columns = names;
        self
    }

    /// Set the conditional columns
    pub fn with_conditional_columns(mut self, names: Vec<String>) -> Self {
        self.conditional_columns = names;
        self
    }

    /// Set the static categorical columns
    pub fn with_static_categorical_columns(mut self, names: Vec<String>) -> Self {
        self.static_categorical_columns = names;
        self
    }

    /// Set the context length explicitly
    pub fn with_context_length(mut self, length: usize) -> Self {
        self.context_length = Some(length);
        self
    }

    /// Set the prediction length explicitly
    pub fn with_prediction_length(mut self, length: usize) -> Self {
        self.prediction_length = Some(length);
        self
    }

    /// Set the frequency used when generating horizon timestamps
    pub fn with_freq(mut self, freq: Freq) -> Self {
        self.freq = Some(freq);
        self
    }

    /// Emit one row per horizon step instead of list-valued rows
    pub fn with_explode_forecasts(mut self, explode: bool) -> Self {
        self.explode_forecasts = explode;
        self
    }

    /// Set the missing-value replacement
    pub fn with_fill_value(mut self, value: f64) -> Self {
        self.fill_value = value;
        self
    }
}

/// Inference pipeline running preprocess, forward, and postprocess
///
/// Preprocess cuts the input into context/horizon windows, forward hands the
/// model exactly the batch fields it asks for, and postprocess shapes the
/// raw forecast tensor back into a table keyed by timestamp and series
/// identifiers.
pub struct ForecastingPipeline<M: ForecastModel> {
    model: M,
    config: PipelineConfig,
    context_length: usize,
    prediction_length: usize,
}

impl<M: ForecastModel> ForecastingPipeline<M> {
    /// Create a pipeline, resolving window geometry against the model
    pub fn new(model: M, config: PipelineConfig) -> Result<Self> {
        let context_length = config
            .context_length
            .or_else(|| model.context_length())
            .ok_or_else(|| {
                Error::InvalidConfig(
                    "context length is not set and the model does not provide one".to_string(),
                )
            })?;
        let prediction_length = config
            .prediction_length
            .or_else(|| model.prediction_length())
            .ok_or_else(|| {
                Error::InvalidConfig(
                    "prediction length is not set and the model does not provide one".to_string(),
                )
            })?;
        if config.target_columns.is_empty() {
            return Err(Error::InvalidConfig(
                "at least one target column is required".to_string(),
            ));
        }
        if let Some(freq) = &config.freq {
            if !freq.is_positive() {
                return Err(Error::InvalidFrequency(format!(
                    "frequency must be positive: {freq}"
                )));
            }
        }
        if config.explode_forecasts && config.timestamp_column.is_some() && config.freq.is_none()
        {
            return Err(Error::InvalidConfig(
                "exploding forecasts along a timestamp column requires a frequency".to_string(),
            ));
        }
        Ok(Self {
            model,
            config,
            context_length,
            prediction_length,
        })
    }

    /// The model driven by this pipeline
    pub fn model(&self) -> &M {
        &self.model
    }

    /// The configuration the pipeline was built with
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Resolved context length
    pub fn context_length(&self) -> usize {
        self.context_length
    }

    /// Resolved prediction length
    pub fn prediction_length(&self) -> usize {
        self.prediction_length
    }

    /// Forecast past the end of the input series
    ///
    /// Each series is first extended with empty rows covering the horizon,
    /// so the last window's forecast origin is the last observed row. The
    /// returned table has one row per window with the forecast origin
    /// timestamp, series identifiers, and list-valued prediction and ground
    /// truth columns per target; with exploded forecasts it has one row per
    /// horizon step instead.
    pub fn forecast<'a>(&self, time_series: impl Into<TableSource<'a>>) -> Result<TimeSeriesFrame> {
        let frame = self.load(time_series.into())?;
        let extended = self.extend_past_end(&frame)?;
        let outputs = self.run(&extended)?;
        self.postprocess(&outputs)
    }

    /// Forecast using known future values for some channels
    ///
    /// `future_time_series` holds rows covering the horizon, for channels
    /// whose future is known or chosen (controls, upcoming timestamps, series
    /// identifiers). Every column it carries must also exist in the main
    /// input; an unknown column fails before the model is invoked. Columns it
    /// omits are treated as missing over the horizon.
    pub fn forecast_with_future<'a, 'b>(
        &self,
        time_series: impl Into<TableSource<'a>>,
        future_time_series: impl Into<TableSource<'b>>,
    ) -> Result<TimeSeriesFrame> {
        let frame = self.load(time_series.into())?;
        let future = self.load(future_time_series.into())?;
        for name in future.column_names() {
            if !frame.has_column(name) {
                return Err(Error::UnknownFutureColumn(name.clone()));
            }
        }
        let combined = frame.concat_rows(&future)?;
        let outputs = self.run(&combined)?;
        self.postprocess(&outputs)
    }

    fn load<'a>(&self, source: TableSource<'a>) -> Result<Cow<'a, TimeSeriesFrame>> {
        match source {
            TableSource::Frame(frame) => Ok(Cow::Borrowed(frame)),
            TableSource::Csv(path) => {
                debug!(path = %path.display(), "loading time series");
                Ok(Cow::Owned(TimeSeriesFrame::read_csv(
                    path,
                    self.config.timestamp_column.as_deref(),
                )?))
            }
        }
    }

    fn extend_past_end(&self, frame: &TimeSeriesFrame) -> Result<TimeSeriesFrame> {
        let Some(timestamp_column) = &self.config.timestamp_column else {
            return Err(Error::InvalidConfig(
                "forecasting past the series end requires a timestamp column; \
                 pass future rows instead"
                    .to_string(),
            ));
        };
        extend_time_series(
            frame,
            timestamp_column,
            &self.config.id_columns,
            self.prediction_length,
            None,
        )
    }

    fn dataset_config(&self) -> DatasetConfig {
        DatasetConfig {
            timestamp_column: self.config.timestamp_column.clone(),
            id_columns: self.config.id_columns.clone(),
            target_columns: self.config.target_columns.clone(),
            observable_columns: self.config.observable_columns.clone(),
            control_columns: self.config.control_columns.clone(),
            conditional_columns: self.config.conditional_columns.clone(),
            static_categorical_columns: self.config.static_categorical_columns.clone(),
            context_length: self.context_length,
            prediction_length: self.prediction_length,
            stride: 1,
            fill_value: self.config.fill_value,
        }
    }

    /// Window the frame, run the model, and reattach the inputs
    fn run(&self, frame: &TimeSeriesFrame) -> Result<Batch> {
        let dataset = ForecastDataset::new(frame, self.dataset_config())?;
        debug!(windows = dataset.len(), "prepared forecast windows");
        let inputs = dataset.batch()?;

        let wanted = self.model.input_names();
        let mut model_inputs = Batch::new();
        for (name, value) in inputs.iter() {
            if wanted.iter().any(|w| w == name) {
                model_inputs.insert(name, value.clone());
            }
        }
        debug!(fields = ?model_inputs.names(), "invoking the model");
        let mut outputs = self.model.forward(&model_inputs)?;

        // hand every input to the next stage, shadowing same-named outputs
        for (name, value) in inputs.iter() {
            outputs.insert(name, value.clone());
        }
        Ok(outputs)
    }

    /// Shape the forecast tensor back into a table
    fn postprocess(&self, outputs: &Batch) -> Result<TimeSeriesFrame> {
        let prediction_key = if outputs.contains(batch::PREDICTION_OUTPUTS) {
            batch::PREDICTION_OUTPUTS
        } else if outputs.contains(batch::PREDICTION_LOGITS) {
            batch::PREDICTION_LOGITS
        } else {
            return Err(Error::MissingBatchField(
                batch::PREDICTION_OUTPUTS.to_string(),
            ));
        };
        let predictions = outputs.tensor3(prediction_key)?;
        let (windows, _, channels) = predictions.dim();
        let n_targets = self.config.target_columns.len();
        if channels < n_targets {
            return Err(Error::ShapeMismatch(format!(
                "model produced {channels} channels for {n_targets} target columns"
            )));
        }

        let future = outputs.tensor3(batch::FUTURE_VALUES)?;
        let future_mask = outputs.tensor3(batch::FUTURE_OBSERVED_MASK)?;
        if future.dim().0 != windows || future.dim().2 < n_targets {
            return Err(Error::ShapeMismatch(format!(
                "future values have shape {:?}, expected {windows} windows and at \
                 least {n_targets} channels",
                future.shape()
            )));
        }
        if future_mask.dim() != future.dim() {
            return Err(Error::ShapeMismatch(format!(
                "future observed mask has shape {:?}, future values {:?}",
                future_mask.shape(),
                future.shape()
            )));
        }

        let origins = if self.config.timestamp_column.is_some() && outputs.contains(batch::TIMESTAMP)
        {
            Some(outputs.timestamps(batch::TIMESTAMP)?)
        } else {
            None
        };
        let ids = if outputs.contains(batch::ID) {
            Some(outputs.ids(batch::ID)?)
        } else {
            None
        };

        if self.config.explode_forecasts {
            self.explode(predictions, future, future_mask, origins, ids)
        } else {
            self.collect_lists(predictions, future, future_mask, origins, ids)
        }
    }

    /// One output row per window, predictions and ground truth as lists
    fn collect_lists(
        &self,
        predictions: ArrayView3<'_, f64>,
        future: ArrayView3<'_, f64>,
        future_mask: ArrayView3<'_, f64>,
        origins: Option<&[Timestamp]>,
        ids: Option<&[Vec<Cell>]>,
    ) -> Result<TimeSeriesFrame> {
        let (windows, horizon, _) = predictions.dim();
        let truth_horizon = future.dim().1;
        let mut columns: Vec<(String, Column)> = Vec::new();

        if let (Some(name), Some(origins)) = (&self.config.timestamp_column, origins) {
            columns.push((name.clone(), Column::Timestamp(origins.to_vec())));
        }
        if let Some(ids) = ids {
            for (j, name) in self.config.id_columns.iter().enumerate() {
                let cells: Vec<Cell> = ids.iter().map(|key| key[j].clone()).collect();
                columns.push((name.clone(), Column::from_cells(name, cells)?));
            }
        }
        for (i, name) in self.config.target_columns.iter().enumerate() {
            let lists: Vec<Vec<f64>> = (0..windows)
                .map(|w| (0..horizon).map(|t| predictions[[w, t, i]]).collect())
                .collect();
            columns.push((format!("{name}_prediction"), Column::FloatList(lists)));
        }
        for (i, name) in self.config.target_columns.iter().enumerate() {
            let lists: Vec<Vec<f64>> = (0..windows)
                .map(|w| {
                    (0..truth_horizon)
                        .map(|t| observed(future[[w, t, i]], future_mask[[w, t, i]]))
                        .collect()
                })
                .collect();
            columns.push((name.clone(), Column::FloatList(lists)));
        }
        TimeSeriesFrame::from_columns(columns)
    }

    /// One output row per horizon step, timestamps continued at the
    /// configured frequency
    fn explode(
        &self,
        predictions: ArrayView3<'_, f64>,
        future: ArrayView3<'_, f64>,
        future_mask: ArrayView3<'_, f64>,
        origins: Option<&[Timestamp]>,
        ids: Option<&[Vec<Cell>]>,
    ) -> Result<TimeSeriesFrame> {
        let (windows, horizon, _) = predictions.dim();
        let truth_horizon = future.dim().1;
        let n_targets = self.config.target_columns.len();

        let mut stamps: Vec<Timestamp> = Vec::new();
        let mut id_cells: Vec<Vec<Cell>> = vec![Vec::new(); self.config.id_columns.len()];
        let mut prediction_values: Vec<Vec<f64>> = vec![Vec::new(); n_targets];
        let mut truth_values: Vec<Vec<f64>> = vec![Vec::new(); n_targets];

        for w in 0..windows {
            let window_stamps = match origins {
                Some(origins) => Some(create_timestamps(
                    origins[w],
                    self.config.freq.as_ref(),
                    None,
                    horizon,
                )?),
                None => None,
            };
            for t in 0..horizon {
                if let Some(window_stamps) = &window_stamps {
                    stamps.push(window_stamps[t]);
                }
                if let Some(ids) = ids {
                    for (j, values) in id_cells.iter_mut().enumerate() {
                        values.push(ids[w][j].clone());
                    }
                }
                for i in 0..n_targets {
                    prediction_values[i].push(predictions[[w, t, i]]);
                    truth_values[i].push(if t < truth_horizon {
                        observed(future[[w, t, i]], future_mask[[w, t, i]])
                    } else {
                        f64::NAN
                    });
                }
            }
        }

        let mut columns: Vec<(String, Column)> = Vec::new();
        if let Some(name) = &self.config.timestamp_column {
            if origins.is_some() {
                columns.push((name.clone(), Column::Timestamp(stamps)));
            }
        }
        if ids.is_some() {
            for (j, name) in self.config.id_columns.iter().enumerate() {
                columns.push((
                    name.clone(),
                    Column::from_cells(name, std::mem::take(&mut id_cells[j]))?,
                ));
            }
        }
        for (i, name) in self.config.target_columns.iter().enumerate() {
            columns.push((
                format!("{name}_prediction"),
                Column::Float(std::mem::take(&mut prediction_values[i])),
            ));
        }
        for (i, name) in self.config.target_columns.iter().enumerate() {
            columns.push((
                name.clone(),
                Column::Float(std::mem::take(&mut truth_values[i])),
            ));
        }
        TimeSeriesFrame::from_columns(columns)
    }
}

/// Keep a value only where its companion mask marks it observed
fn observed(value: f64, mask: f64) -> f64 {
    if mask >= 0.5 {
        value
    } else {
        f64::NAN
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::batch::BatchValue;
    use crate::data::frame::Column;
    use crate::model::SeasonalNaiveModel;
    use ndarray::Array3;
    use std::cell::Cell as StdCell;

    fn trend_frame(n: usize) -> TimeSeriesFrame {
        TimeSeriesFrame::from_columns(vec![
            (
                "ts".to_string(),
                Column::Timestamp((0..n as i64).map(Timestamp::Number).collect()),
            ),
            (
                "close".to_string(),
                Column::Float((0..n).map(|i| i as f64).collect()),
            ),
        ])
        .unwrap()
    }

    fn base_config() -> PipelineConfig {
        PipelineConfig::new()
            .with_timestamp_column("ts")
            .with_target_columns(vec!["close".to_string()])
            .with_context_length(4)
            .with_prediction_length(2)
    }

    #[test]
    fn test_forecast_past_series_end() {
        let model = SeasonalNaiveModel::new(4, 2, 1).unwrap();
        let pipeline = ForecastingPipeline::new(model, base_config()).unwrap();
        let result = pipeline.forecast(&trend_frame(8)).unwrap();

        // extension adds the horizon, so the last origin is the last row
        let origins = result.timestamps("ts").unwrap();
        assert_eq!(origins[origins.len() - 1], Timestamp::Number(7));

        let last = result.num_rows() - 1;
        let prediction = result.cell(last, "close_prediction").unwrap();
        assert_eq!(prediction, Cell::FloatList(vec![7.0, 7.0]));

        // ground truth past the series end is unknown
        let truth = result.cell(last, "close").unwrap();
        match truth {
            Cell::FloatList(values) => {
                assert_eq!(values.len(), 2);
                assert!(values.iter().all(|v| v.is_nan()));
            }
            other => panic!("expected a list cell, got {other:?}"),
        }
    }

    #[test]
    fn test_column_order() {
        let model = SeasonalNaiveModel::new(4, 2, 1).unwrap();
        let frame = TimeSeriesFrame::from_columns(vec![
            (
                "ts".to_string(),
                Column::Timestamp((0..8).map(Timestamp::Number).collect()),
            ),
            (
                "asset".to_string(),
                Column::Str(vec![Some("BTC".to_string()); 8]),
            ),
            (
                "close".to_string(),
                Column::Float((0..8).map(|i| i as f64).collect()),
            ),
        ])
        .unwrap();
        let config = base_config().with_id_columns(vec!["asset".to_string()]);
        let pipeline = ForecastingPipeline::new(model, config).unwrap();
        let result = pipeline.forecast(&frame).unwrap();
        assert_eq!(
            result.column_names(),
            &["ts", "asset", "close_prediction", "close"]
        );
    }

    #[test]
    fn test_each_target_keeps_its_own_channel() {
        let model = SeasonalNaiveModel::new(4, 2, 1).unwrap();
        let frame = TimeSeriesFrame::from_columns(vec![
            (
                "ts".to_string(),
                Column::Timestamp((0..8).map(Timestamp::Number).collect()),
            ),
            (
                "high".to_string(),
                Column::Float((0..8).map(|i| 100.0 + i as f64).collect()),
            ),
            (
                "low".to_string(),
                Column::Float((0..8).map(|i| i as f64).collect()),
            ),
            (
                "volume".to_string(),
                Column::Float((0..8).map(|i| 1000.0 + i as f64).collect()),
            ),
        ])
        .unwrap();
        let config = PipelineConfig::new()
            .with_timestamp_column("ts")
            .with_target_columns(vec!["high".to_string(), "low".to_string()])
            .with_observable_columns(vec!["volume".to_string()])
            .with_context_length(4)
            .with_prediction_length(2);
        let pipeline = ForecastingPipeline::new(model, config).unwrap();
        let result = pipeline.forecast(&frame).unwrap();

        assert_eq!(
            result.column_names(),
            &["ts", "high_prediction", "low_prediction", "high", "low"]
        );

        // the first window's carry-forward values differ per channel, so a
        // crossed channel index would show up here
        assert_eq!(
            result.cell(0, "high_prediction").unwrap(),
            Cell::FloatList(vec![103.0, 103.0])
        );
        assert_eq!(
            result.cell(0, "low_prediction").unwrap(),
            Cell::FloatList(vec![3.0, 3.0])
        );
        assert_eq!(
            result.cell(0, "high").unwrap(),
            Cell::FloatList(vec![104.0, 105.0])
        );
        assert_eq!(
            result.cell(0, "low").unwrap(),
            Cell::FloatList(vec![4.0, 5.0])
        );

        // observables feed the model but are never forecast
        assert!(!result.has_column("volume_prediction"));
        assert!(!result.has_column("volume"));
    }

    #[test]
    fn test_unknown_future_column_fails_before_model() {
        struct CountingModel<'a> {
            calls: &'a StdCell<usize>,
        }
        impl ForecastModel for CountingModel<'_> {
            fn input_names(&self) -> Vec<String> {
                vec![batch::PAST_VALUES.to_string()]
            }
            fn context_length(&self) -> Option<usize> {
                Some(4)
            }
            fn prediction_length(&self) -> Option<usize> {
                Some(2)
            }
            fn forward(&self, inputs: &Batch) -> Result<Batch> {
                self.calls.set(self.calls.get() + 1);
                let past = inputs.tensor3(batch::PAST_VALUES)?;
                let (b, _, c) = past.dim();
                let mut out = Batch::new();
                out.insert(
                    batch::PREDICTION_OUTPUTS,
                    BatchValue::Tensor(Array3::<f64>::zeros((b, 2, c)).into_dyn()),
                );
                Ok(out)
            }
        }

        let calls = StdCell::new(0);
        let model = CountingModel { calls: &calls };
        let pipeline = ForecastingPipeline::new(model, base_config()).unwrap();

        let future = TimeSeriesFrame::from_columns(vec![(
            "mystery".to_string(),
            Column::Float(vec![1.0, 2.0]),
        )])
        .unwrap();
        let result = pipeline.forecast_with_future(&trend_frame(8), &future);
        assert!(matches!(result, Err(Error::UnknownFutureColumn(c)) if c == "mystery"));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_prediction_logits_fallback() {
        struct LogitModel;
        impl ForecastModel for LogitModel {
            fn input_names(&self) -> Vec<String> {
                vec![batch::PAST_VALUES.to_string()]
            }
            fn forward(&self, inputs: &Batch) -> Result<Batch> {
                let past = inputs.tensor3(batch::PAST_VALUES)?;
                let (b, _, c) = past.dim();
                let mut out = Batch::new();
                out.insert(
                    batch::PREDICTION_LOGITS,
                    BatchValue::Tensor(Array3::from_elem((b, 2, c), 0.25).into_dyn()),
                );
                Ok(out)
            }
        }

        let pipeline = ForecastingPipeline::new(LogitModel, base_config()).unwrap();
        let result = pipeline.forecast(&trend_frame(8)).unwrap();
        assert_eq!(result.num_rows(), 5);
        assert_eq!(
            result.cell(0, "close_prediction").unwrap(),
            Cell::FloatList(vec![0.25, 0.25])
        );
    }

    #[test]
    fn test_missing_prediction_output_errors() {
        struct EmptyOutputModel;
        impl ForecastModel for EmptyOutputModel {
            fn input_names(&self) -> Vec<String> {
                vec![batch::PAST_VALUES.to_string()]
            }
            fn forward(&self, _inputs: &Batch) -> Result<Batch> {
                Ok(Batch::new())
            }
        }

        let pipeline = ForecastingPipeline::new(EmptyOutputModel, base_config()).unwrap();
        let result = pipeline.forecast(&trend_frame(8));
        assert!(matches!(
            result,
            Err(Error::MissingBatchField(field)) if field == batch::PREDICTION_OUTPUTS
        ));
    }

    #[test]
    fn test_forecast_with_known_future() {
        let model = SeasonalNaiveModel::new(4, 2, 1).unwrap();
        let pipeline = ForecastingPipeline::new(model, base_config()).unwrap();

        let future = TimeSeriesFrame::from_columns(vec![
            (
                "ts".to_string(),
                Column::Timestamp(vec![Timestamp::Number(8), Timestamp::Number(9)]),
            ),
            ("close".to_string(), Column::Float(vec![100.0, 200.0])),
        ])
        .unwrap();
        let result = pipeline
            .forecast_with_future(&trend_frame(8), &future)
            .unwrap();

        // known future values survive into the ground truth column
        let last = result.num_rows() - 1;
        assert_eq!(
            result.cell(last, "close").unwrap(),
            Cell::FloatList(vec![100.0, 200.0])
        );
    }

    #[test]
    fn test_exploded_forecasts() {
        let model = SeasonalNaiveModel::new(4, 3, 1).unwrap();
        let config = base_config()
            .with_prediction_length(3)
            .with_explode_forecasts(true)
            .with_freq(Freq::Step(1));
        let pipeline = ForecastingPipeline::new(model, config).unwrap();

        // 4 observed rows, extended by 3: exactly one window
        let result = pipeline.forecast(&trend_frame(4)).unwrap();
        assert_eq!(result.num_rows(), 3);

        // generated stamps start one step after the forecast origin
        let stamps = result.timestamps("ts").unwrap();
        assert_eq!(
            stamps,
            &[
                Timestamp::Number(4),
                Timestamp::Number(5),
                Timestamp::Number(6)
            ]
        );
        assert_eq!(result.floats("close_prediction").unwrap(), vec![3.0; 3]);
    }

    #[test]
    fn test_explode_requires_freq() {
        let model = SeasonalNaiveModel::new(4, 2, 1).unwrap();
        let config = base_config().with_explode_forecasts(true);
        assert!(ForecastingPipeline::new(model, config).is_err());
    }

    #[test]
    fn test_lengths_fall_back_to_model() {
        let model = SeasonalNaiveModel::new(6, 3, 1).unwrap();
        let config = PipelineConfig::new()
            .with_timestamp_column("ts")
            .with_target_columns(vec!["close".to_string()]);
        let pipeline = ForecastingPipeline::new(model, config).unwrap();
        assert_eq!(pipeline.context_length(), 6);
        assert_eq!(pipeline.prediction_length(), 3);
    }
}

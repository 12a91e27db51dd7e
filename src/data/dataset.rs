//! Sliding-window dataset for forecasting
//!
//! This module provides:
//! - `DatasetConfig`, the column roles and window geometry
//! - `ForecastDataset`, which cuts per-series windows out of a frame and
//!   stacks them into model-ready batches

use ndarray::{Array2, Array3};

use crate::data::batch::{self, Batch, BatchValue};
use crate::data::frame::{Cell, Column, TimeSeriesFrame};
use crate::data::timestamps::Timestamp;
use crate::error::{Error, Result};

/// Column roles and window geometry for a forecasting dataset
///
/// Channels are ordered target columns first, then observables, controls,
/// and conditionals; later duplicates of a name are dropped. Downstream
/// code relies on targets occupying the leading channels.
#[derive(Debug, Clone)]
pub struct DatasetConfig {
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
    /// Number of context rows per window
    pub context_length: usize,
    /// Number of horizon rows per window
    pub prediction_length: usize,
    /// Offset between consecutive window starts
    pub stride: usize,
    /// Replacement for missing values in the value tensors
    pub fill_value: f64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            timestamp_column: None,
            id_columns: Vec::new(),
            target_columns: Vec::new(),
            observable_columns: Vec::new(),
            control_columns: Vec::new(),
            conditional_columns: Vec::new(),
            static_categorical_columns: Vec::new(),
            context_length: 64,
            prediction_length: 16,
            stride: 1,
            fill_value: 0.0,
        }
    }
}

impl DatasetConfig {
    /// Create a config with default window geometry
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

    /// Set the context length
    pub fn with_context_length(mut self, length: usize) -> Self {
        self.context_length = length;
        self
    }

    /// Set the prediction length
    pub fn with_prediction_length(mut self, length: usize) -> Self {
        self.prediction_length = length;
        self
    }

    /// Set the window stride
    pub fn with_stride(mut self, stride: usize) -> Self {
        self.stride = stride;
        self
    }

    /// Set the missing-value replacement
    pub fn with_fill_value(mut self, value: f64) -> Self {
        self.fill_value = value;
        self
    }

    /// Value channels in model order: targets, observables, controls,
    /// conditionals, keeping the first occurrence of each name
    pub fn input_columns(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let all = self
            .target_columns
            .iter()
            .chain(&self.observable_columns)
            .chain(&self.control_columns)
            .chain(&self.conditional_columns);
        for name in all {
            if !out.contains(name) {
                out.push(name.clone());
            }
        }
        out
    }

    /// Check the config for unusable settings
    pub fn validate(&self) -> Result<()> {
        if self.target_columns.is_empty() {
            return Err(Error::InvalidConfig(
                "at least one target column is required".to_string(),
            ));
        }
        if self.context_length == 0 {
            return Err(Error::InvalidConfig(
                "context length must be at least 1".to_string(),
            ));
        }
        if self.prediction_length == 0 {
            return Err(Error::InvalidConfig(
                "prediction length must be at least 1".to_string(),
            ));
        }
        if self.stride == 0 {
            return Err(Error::InvalidConfig(
                "stride must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Per-series data cut into sliding context/horizon windows
struct SeriesData {
    key: Vec<Cell>,
    /// Raw channel values in row order, `(rows, channels)`, NaN kept
    values: Array2<f64>,
    /// Encoded static values for this series
    statics: Vec<f64>,
    /// Sorted timestamps, present when the config names a timestamp column
    stamps: Option<Vec<Timestamp>>,
}

/// Windowed view over a frame, ready to be stacked into batches
pub struct ForecastDataset {
    config: DatasetConfig,
    input_columns: Vec<String>,
    series: Vec<SeriesData>,
    /// `(series index, start row)` of each window
    windows: Vec<(usize, usize)>,
}

impl ForecastDataset {
    /// Cut `frame` into windows according to `config`
    ///
    /// Rows are grouped by the identifier columns and sorted by timestamp
    /// within each group. Groups shorter than one full window contribute no
    /// windows.
    pub fn new(frame: &TimeSeriesFrame, config: DatasetConfig) -> Result<Self> {
        config.validate()?;
        // before column extraction: zero-row input is a data problem, not a
        // column type problem
        if frame.num_rows() == 0 {
            return Err(Error::InsufficientData(
                "the input frame has no rows".to_string(),
            ));
        }
        let input_columns = config.input_columns();

        let channel_data: Vec<Vec<f64>> = input_columns
            .iter()
            .map(|name| frame.floats(name))
            .collect::<Result<_>>()?;
        let static_data: Vec<Vec<f64>> = config
            .static_categorical_columns
            .iter()
            .map(|name| encoded_statics(frame, name))
            .collect::<Result<_>>()?;
        let stamps = match &config.timestamp_column {
            Some(name) => Some(frame.timestamps(name)?),
            None => None,
        };

        let groups =
            frame.sorted_group_indices(&config.id_columns, config.timestamp_column.as_deref())?;

        let mut series = Vec::with_capacity(groups.len());
        let mut windows = Vec::new();
        let window_len = config.context_length + config.prediction_length;
        for group in groups {
            let rows = group.rows.len();
            if rows == 0 {
                continue;
            }
            let mut values = Array2::<f64>::zeros((rows, channel_data.len()));
            for (i, &row) in group.rows.iter().enumerate() {
                for (c, data) in channel_data.iter().enumerate() {
                    values[[i, c]] = data[row];
                }
            }
            let statics: Vec<f64> = static_data
                .iter()
                .map(|data| data[group.rows[0]])
                .collect();
            let group_stamps =
                stamps.map(|all| group.rows.iter().map(|&row| all[row]).collect());

            let index = series.len();
            if rows >= window_len {
                let mut start = 0;
                while start + window_len <= rows {
                    windows.push((index, start));
                    start += config.stride;
                }
            }
            series.push(SeriesData {
                key: group.key,
                values,
                statics,
                stamps: group_stamps,
            });
        }

        Ok(Self {
            config,
            input_columns,
            series,
            windows,
        })
    }

    /// Number of windows
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Whether the dataset produced no windows
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// The configuration the dataset was built with
    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// Value channels in model order
    pub fn input_columns(&self) -> &[String] {
        &self.input_columns
    }

    /// Stack every window into one batch
    ///
    /// Value tensors have missing entries replaced by the configured fill
    /// value, with companion masks holding 1.0 where a value was observed.
    /// The forecast origin timestamp of a window is its last context row.
    pub fn batch(&self) -> Result<Batch> {
        if self.windows.is_empty() {
            return Err(Error::InsufficientData(format!(
                "no series has the {} rows needed for one window",
                self.config.context_length + self.config.prediction_length
            )));
        }

        let b = self.windows.len();
        let context = self.config.context_length;
        let prediction = self.config.prediction_length;
        let channels = self.input_columns.len();
        let fill = self.config.fill_value;

        let mut past = Array3::<f64>::zeros((b, context, channels));
        let mut past_mask = Array3::<f64>::zeros((b, context, channels));
        let mut future = Array3::<f64>::zeros((b, prediction, channels));
        let mut future_mask = Array3::<f64>::zeros((b, prediction, channels));

        for (w, &(s, start)) in self.windows.iter().enumerate() {
            let values = &self.series[s].values;
            for t in 0..context {
                for c in 0..channels {
                    let v = values[[start + t, c]];
                    past[[w, t, c]] = if v.is_nan() { fill } else { v };
                    past_mask[[w, t, c]] = if v.is_nan() { 0.0 } else { 1.0 };
                }
            }
            for t in 0..prediction {
                for c in 0..channels {
                    let v = values[[start + context + t, c]];
                    future[[w, t, c]] = if v.is_nan() { fill } else { v };
                    future_mask[[w, t, c]] = if v.is_nan() { 0.0 } else { 1.0 };
                }
            }
        }

        let mut out = Batch::new();
        out.insert(batch::PAST_VALUES, BatchValue::Tensor(past.into_dyn()));
        out.insert(
            batch::PAST_OBSERVED_MASK,
            BatchValue::Tensor(past_mask.into_dyn()),
        );
        out.insert(batch::FUTURE_VALUES, BatchValue::Tensor(future.into_dyn()));
        out.insert(
            batch::FUTURE_OBSERVED_MASK,
            BatchValue::Tensor(future_mask.into_dyn()),
        );

        if !self.config.static_categorical_columns.is_empty() {
            let k = self.config.static_categorical_columns.len();
            let mut statics = Array2::<f64>::zeros((b, k));
            for (w, &(s, _)) in self.windows.iter().enumerate() {
                for (c, &v) in self.series[s].statics.iter().enumerate() {
                    statics[[w, c]] = v;
                }
            }
            out.insert(
                batch::STATIC_CATEGORICAL_VALUES,
                BatchValue::Tensor(statics.into_dyn()),
            );
        }

        if self.config.timestamp_column.is_some() {
            let mut origins = Vec::with_capacity(b);
            for &(s, start) in &self.windows {
                let stamps = self.series[s].stamps.as_ref().ok_or_else(|| {
                    Error::ShapeMismatch("series is missing its timestamps".to_string())
                })?;
                origins.push(stamps[start + context - 1]);
            }
            out.insert(batch::TIMESTAMP, BatchValue::Timestamps(origins));
        }

        if !self.config.id_columns.is_empty() {
            let ids: Vec<Vec<Cell>> = self
                .windows
                .iter()
                .map(|&(s, _)| self.series[s].key.clone())
                .collect();
            out.insert(batch::ID, BatchValue::Ids(ids));
        }

        Ok(out)
    }
}

/// Numeric values of a static column
///
/// String columns are encoded to category codes in first-appearance order
/// over the whole frame; numeric columns pass through.
fn encoded_statics(frame: &TimeSeriesFrame, name: &str) -> Result<Vec<f64>> {
    match frame.column(name)? {
        Column::Str(values) => {
            let mut seen: Vec<&str> = Vec::new();
            let mut codes = Vec::with_capacity(values.len());
            for value in values {
                match value.as_deref() {
                    Some(s) => {
                        let code = seen.iter().position(|k| *k == s).unwrap_or_else(|| {
                            seen.push(s);
                            seen.len() - 1
                        });
                        codes.push(code as f64);
                    }
                    None => codes.push(f64::NAN),
                }
            }
            Ok(codes)
        }
        _ => frame.floats(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::frame::Column;

    fn hourly(n: usize, start: i64) -> Vec<Timestamp> {
        (0..n as i64).map(|i| Timestamp::Number(start + i)).collect()
    }

    fn single_series_frame(n: usize) -> TimeSeriesFrame {
        TimeSeriesFrame::from_columns(vec![
            ("ts".to_string(), Column::Timestamp(hourly(n, 0))),
            (
                "close".to_string(),
                Column::Float((0..n).map(|i| i as f64).collect()),
            ),
            (
                "volume".to_string(),
                Column::Float((0..n).map(|i| 10.0 + i as f64).collect()),
            ),
        ])
        .unwrap()
    }

    fn base_config() -> DatasetConfig {
        DatasetConfig::new()
            .with_timestamp_column("ts")
            .with_target_columns(vec!["close".to_string()])
            .with_context_length(4)
            .with_prediction_length(2)
    }

    #[test]
    fn test_window_count_and_stride() {
        let frame = single_series_frame(10);
        let dataset = ForecastDataset::new(&frame, base_config()).unwrap();
        // 10 rows, window of 6, stride 1
        assert_eq!(dataset.len(), 5);

        let strided = ForecastDataset::new(&frame, base_config().with_stride(2)).unwrap();
        assert_eq!(strided.len(), 3);
    }

    #[test]
    fn test_short_series_yields_no_windows() {
        let frame = single_series_frame(5);
        let dataset = ForecastDataset::new(&frame, base_config()).unwrap();
        assert!(dataset.is_empty());
        assert!(matches!(
            dataset.batch(),
            Err(Error::InsufficientData(_))
        ));
    }

    #[test]
    fn test_empty_frame_reports_insufficient_data() {
        // zero-row CSV files type their value columns as empty strings
        let frame = TimeSeriesFrame::from_columns(vec![
            ("ts".to_string(), Column::Timestamp(Vec::new())),
            ("close".to_string(), Column::Str(Vec::new())),
        ])
        .unwrap();
        let result = ForecastDataset::new(&frame, base_config());
        assert!(matches!(result, Err(Error::InsufficientData(_))));
    }

    #[test]
    fn test_targets_lead_channel_order() {
        let config = base_config()
            .with_observable_columns(vec!["volume".to_string()])
            .with_conditional_columns(vec!["close".to_string()]);
        assert_eq!(config.input_columns(), vec!["close", "volume"]);
    }

    #[test]
    fn test_batch_shapes_and_contents() {
        let frame = single_series_frame(6);
        let config = base_config().with_observable_columns(vec!["volume".to_string()]);
        let dataset = ForecastDataset::new(&frame, config).unwrap();
        assert_eq!(dataset.len(), 1);

        let batch = dataset.batch().unwrap();
        let past = batch.tensor(batch::PAST_VALUES).unwrap();
        assert_eq!(past.shape(), &[1, 4, 2]);
        assert_eq!(past[[0, 0, 0]], 0.0);
        assert_eq!(past[[0, 3, 0]], 3.0);
        assert_eq!(past[[0, 0, 1]], 10.0);

        let future = batch.tensor(batch::FUTURE_VALUES).unwrap();
        assert_eq!(future.shape(), &[1, 2, 2]);
        assert_eq!(future[[0, 0, 0]], 4.0);
        assert_eq!(future[[0, 1, 0]], 5.0);

        let origins = batch.timestamps(batch::TIMESTAMP).unwrap();
        assert_eq!(origins, &[Timestamp::Number(3)]);
    }

    #[test]
    fn test_missing_values_are_filled_and_masked() {
        let frame = TimeSeriesFrame::from_columns(vec![
            ("ts".to_string(), Column::Timestamp(hourly(6, 0))),
            (
                "close".to_string(),
                Column::Float(vec![1.0, f64::NAN, 3.0, 4.0, f64::NAN, 6.0]),
            ),
        ])
        .unwrap();
        let dataset = ForecastDataset::new(&frame, base_config()).unwrap();
        let batch = dataset.batch().unwrap();

        let past = batch.tensor(batch::PAST_VALUES).unwrap();
        let mask = batch.tensor(batch::PAST_OBSERVED_MASK).unwrap();
        assert_eq!(past[[0, 1, 0]], 0.0);
        assert_eq!(mask[[0, 1, 0]], 0.0);
        assert_eq!(mask[[0, 0, 0]], 1.0);

        let future = batch.tensor(batch::FUTURE_VALUES).unwrap();
        let future_mask = batch.tensor(batch::FUTURE_OBSERVED_MASK).unwrap();
        assert_eq!(future[[0, 0, 0]], 0.0);
        assert_eq!(future_mask[[0, 0, 0]], 0.0);
        assert_eq!(future_mask[[0, 1, 0]], 1.0);
    }

    #[test]
    fn test_grouped_windows_and_ids() {
        let frame = TimeSeriesFrame::from_columns(vec![
            (
                "ts".to_string(),
                Column::Timestamp(
                    hourly(6, 0).into_iter().chain(hourly(6, 100)).collect(),
                ),
            ),
            (
                "asset".to_string(),
                Column::Str(
                    std::iter::repeat(Some("BTC".to_string()))
                        .take(6)
                        .chain(std::iter::repeat(Some("ETH".to_string())).take(6))
                        .collect(),
                ),
            ),
            (
                "close".to_string(),
                Column::Float((0..12).map(|i| i as f64).collect()),
            ),
        ])
        .unwrap();
        let config = base_config().with_id_columns(vec!["asset".to_string()]);
        let dataset = ForecastDataset::new(&frame, config).unwrap();
        // one window per series
        assert_eq!(dataset.len(), 2);

        let batch = dataset.batch().unwrap();
        let ids = batch.ids(batch::ID).unwrap();
        assert_eq!(ids[0], vec![Cell::Str("BTC".to_string())]);
        assert_eq!(ids[1], vec![Cell::Str("ETH".to_string())]);

        // windows never span series boundaries
        let past = batch.tensor(batch::PAST_VALUES).unwrap();
        assert_eq!(past[[1, 0, 0]], 6.0);
    }

    #[test]
    fn test_static_categorical_values() {
        let frame = TimeSeriesFrame::from_columns(vec![
            ("ts".to_string(), Column::Timestamp(hourly(6, 0))),
            (
                "close".to_string(),
                Column::Float((0..6).map(|i| i as f64).collect()),
            ),
            (
                "exchange_code".to_string(),
                Column::Int(vec![Some(7); 6]),
            ),
            (
                "venue".to_string(),
                Column::Str(vec![Some("NYSE".to_string()); 6]),
            ),
        ])
        .unwrap();
        let config = base_config().with_static_categorical_columns(vec![
            "exchange_code".to_string(),
            "venue".to_string(),
        ]);
        let dataset = ForecastDataset::new(&frame, config).unwrap();
        let batch = dataset.batch().unwrap();
        let statics = batch.tensor(batch::STATIC_CATEGORICAL_VALUES).unwrap();
        assert_eq!(statics.shape(), &[1, 2]);
        // numeric statics pass through, string statics become codes
        assert_eq!(statics[[0, 0]], 7.0);
        assert_eq!(statics[[0, 1]], 0.0);
    }

    #[test]
    fn test_string_statics_encode_by_first_appearance() {
        let frame = TimeSeriesFrame::from_columns(vec![
            (
                "venue".to_string(),
                Column::Str(vec![
                    Some("NYSE".to_string()),
                    Some("LSE".to_string()),
                    Some("NYSE".to_string()),
                    None,
                ]),
            ),
        ])
        .unwrap();
        let codes = encoded_statics(&frame, "venue").unwrap();
        assert_eq!(codes[0], 0.0);
        assert_eq!(codes[1], 1.0);
        assert_eq!(codes[2], 0.0);
        assert!(codes[3].is_nan());
    }

    #[test]
    fn test_validate_rejects_bad_config() {
        assert!(DatasetConfig::new().validate().is_err());
        assert!(base_config().with_context_length(0).validate().is_err());
        assert!(base_config().with_stride(0).validate().is_err());
    }
}

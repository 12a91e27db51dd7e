//! Forecast accuracy metrics

use crate::data::frame::{Column, TimeSeriesFrame};
use crate::error::{Error, Result};

/// Pairs of (actual, predicted) where the actual value is known
fn known_pairs<'a>(
    actual: &'a [f64],
    predicted: &'a [f64],
) -> Result<impl Iterator<Item = (f64, f64)> + 'a> {
    if actual.len() != predicted.len() {
        return Err(Error::ShapeMismatch(format!(
            "{} actual values against {} predictions",
            actual.len(),
            predicted.len()
        )));
    }
    Ok(actual
        .iter()
        .zip(predicted)
        .filter(|(a, _)| !a.is_nan())
        .map(|(&a, &p)| (a, p)))
}

fn mean(values: impl Iterator<Item = f64>) -> Result<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        sum += v;
        count += 1;
    }
    if count == 0 {
        return Err(Error::InsufficientData(
            "no observed values to score against".to_string(),
        ));
    }
    Ok(sum / count as f64)
}

/// Mean absolute error, skipping steps with unknown actuals
pub fn mae(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    mean(known_pairs(actual, predicted)?.map(|(a, p)| (a - p).abs()))
}

/// Mean squared error, skipping steps with unknown actuals
pub fn mse(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    mean(known_pairs(actual, predicted)?.map(|(a, p)| (a - p) * (a - p)))
}

/// Root mean squared error, skipping steps with unknown actuals
pub fn rmse(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    Ok(mse(actual, predicted)?.sqrt())
}

/// Mean absolute percentage error, in percent
///
/// Steps with a zero actual are skipped along with unknown actuals.
pub fn mape(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    mean(
        known_pairs(actual, predicted)?
            .filter(|(a, _)| *a != 0.0)
            .map(|(a, p)| 100.0 * (a - p).abs() / a.abs()),
    )
}

/// Symmetric mean absolute percentage error, in percent
///
/// Steps where both sides are zero contribute zero error.
pub fn smape(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    mean(known_pairs(actual, predicted)?.map(|(a, p)| {
        let denominator = (a.abs() + p.abs()) / 2.0;
        if denominator == 0.0 {
            0.0
        } else {
            100.0 * (a - p).abs() / denominator
        }
    }))
}

/// Accuracy summary of one target column of a forecast table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastMetrics {
    pub mae: f64,
    pub rmse: f64,
    pub mape: f64,
    pub smape: f64,
}

/// Score a forecast table's predictions for one target against its ground
/// truth column
///
/// Works on both output layouts: list-valued rows are flattened, exploded
/// rows are taken as they are. Horizon steps whose ground truth is unknown
/// are skipped.
pub fn forecast_metrics(frame: &TimeSeriesFrame, target: &str) -> Result<ForecastMetrics> {
    let actual = flatten(frame, target)?;
    let predicted = flatten(frame, &format!("{target}_prediction"))?;
    if actual.len() != predicted.len() {
        return Err(Error::ShapeMismatch(format!(
            "column '{target}' has {} values, its prediction column {}",
            actual.len(),
            predicted.len()
        )));
    }
    Ok(ForecastMetrics {
        mae: mae(&actual, &predicted)?,
        rmse: rmse(&actual, &predicted)?,
        mape: mape(&actual, &predicted)?,
        smape: smape(&actual, &predicted)?,
    })
}

fn flatten(frame: &TimeSeriesFrame, name: &str) -> Result<Vec<f64>> {
    match frame.column(name)? {
        Column::Float(values) => Ok(values.clone()),
        Column::FloatList(lists) => Ok(lists.iter().flatten().copied().collect()),
        other => Err(Error::ColumnTypeMismatch {
            column: name.to_string(),
            details: format!("expected a numeric column, found {}", other.kind_name()),
        }),
    }
}

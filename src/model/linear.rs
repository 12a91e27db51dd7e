//! Linear autoregressive forecaster

use ndarray::{Array1, Array2, Array3};

use crate::data::batch::{self, Batch, BatchValue};
use crate::error::{Error, Result};
use crate::model::ForecastModel;

/// Direct multi-horizon linear regression on the context window
///
/// Each channel is regressed independently: the context values of a channel
/// (plus an intercept) are the features, and every horizon step gets its own
/// set of coefficients, solved from ridge-regularized normal equations.
#[derive(Debug, Clone)]
pub struct LinearModel {
    context_length: usize,
    prediction_length: usize,
    ridge: f64,
    /// Per-channel coefficients, `(context + 1, prediction)`, intercept first
    weights: Vec<Array2<f64>>,
}

impl LinearModel {
    /// Create an unfitted model for the given window geometry
    pub fn new(context_length: usize, prediction_length: usize) -> Result<Self> {
        if context_length == 0 || prediction_length == 0 {
            return Err(Error::InvalidConfig(
                "context and prediction lengths must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            context_length,
            prediction_length,
            ridge: 1e-6,
            weights: Vec::new(),
        })
    }

    /// Set the ridge penalty added to the normal-equation diagonal
    pub fn with_ridge(mut self, ridge: f64) -> Self {
        self.ridge = ridge;
        self
    }

    /// Whether the model has been fitted
    pub fn is_fitted(&self) -> bool {
        !self.weights.is_empty()
    }

    /// Fit coefficients from a training batch
    ///
    /// Expects the `past_values` and `future_values` tensors a dataset batch
    /// provides, with shapes matching the model's window geometry.
    pub fn fit(&mut self, training: &Batch) -> Result<()> {
        let past = training.tensor3(batch::PAST_VALUES)?;
        let future = training.tensor3(batch::FUTURE_VALUES)?;
        let (n, context, channels) = past.dim();
        let (n_future, prediction, future_channels) = future.dim();
        if context != self.context_length || prediction != self.prediction_length {
            return Err(Error::ShapeMismatch(format!(
                "training windows are ({context}, {prediction}), model expects ({}, {})",
                self.context_length, self.prediction_length
            )));
        }
        if n != n_future || channels != future_channels {
            return Err(Error::ShapeMismatch(format!(
                "past values are ({n}, {channels}) windows x channels, future values are ({n_future}, {future_channels})"
            )));
        }
        if n == 0 {
            return Err(Error::InsufficientData(
                "cannot fit on an empty batch".to_string(),
            ));
        }

        let n_cols = context + 1;
        let mut weights = Vec::with_capacity(channels);
        for c in 0..channels {
            let mut design = Array2::<f64>::ones((n, n_cols));
            for k in 0..n {
                for j in 0..context {
                    design[[k, j + 1]] = past[[k, j, c]];
                }
            }

            let mut xtx = Array2::<f64>::zeros((n_cols, n_cols));
            for i in 0..n_cols {
                for j in 0..n_cols {
                    let mut sum = 0.0;
                    for k in 0..n {
                        sum += design[[k, i]] * design[[k, j]];
                    }
                    xtx[[i, j]] = sum;
                }
            }
            for i in 0..n_cols {
                xtx[[i, i]] += self.ridge;
            }

            let mut coeffs = Array2::<f64>::zeros((n_cols, prediction));
            for p in 0..prediction {
                let mut xty = Array1::<f64>::zeros(n_cols);
                for i in 0..n_cols {
                    let mut sum = 0.0;
                    for k in 0..n {
                        sum += design[[k, i]] * future[[k, p, c]];
                    }
                    xty[i] = sum;
                }
                let solution = solve_linear_system(&xtx, &xty);
                for i in 0..n_cols {
                    coeffs[[i, p]] = solution[i];
                }
            }
            weights.push(coeffs);
        }
        self.weights = weights;
        Ok(())
    }
}

impl ForecastModel for LinearModel {
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
        if !self.is_fitted() {
            return Err(Error::InvalidConfig(
                "linear model must be fitted before forecasting".to_string(),
            ));
        }
        let past = inputs.tensor3(batch::PAST_VALUES)?;
        let (b, context, channels) = past.dim();
        if context != self.context_length {
            return Err(Error::ShapeMismatch(format!(
                "expected context length {}, got {context}",
                self.context_length
            )));
        }
        if channels != self.weights.len() {
            return Err(Error::ShapeMismatch(format!(
                "model was fitted for {} channels, got {channels}",
                self.weights.len()
            )));
        }

        let mut prediction = Array3::<f64>::zeros((b, self.prediction_length, channels));
        for (c, coeffs) in self.weights.iter().enumerate() {
            for w in 0..b {
                for p in 0..self.prediction_length {
                    let mut value = coeffs[[0, p]];
                    for j in 0..context {
                        value += coeffs[[j + 1, p]] * past[[w, j, c]];
                    }
                    prediction[[w, p, c]] = value;
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

/// Solve `Ax = b` by Gauss-Jordan elimination with partial pivoting
fn solve_linear_system(a: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = a.nrows();
    if n == 0 || n != a.ncols() || n != b.len() {
        return Array1::zeros(0);
    }

    let mut aug = Array2::<f64>::zeros((n, n + 1));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = a[[i, j]];
        }
        aug[[i, n]] = b[i];
    }

    for col in 0..n {
        let mut max_row = col;
        let mut max_val = aug[[col, col]].abs();
        for row in (col + 1)..n {
            if aug[[row, col]].abs() > max_val {
                max_val = aug[[row, col]].abs();
                max_row = row;
            }
        }
        if max_row != col {
            for j in 0..=n {
                let temp = aug[[col, j]];
                aug[[col, j]] = aug[[max_row, j]];
                aug[[max_row, j]] = temp;
            }
        }
        if aug[[col, col]].abs() < 1e-10 {
            continue;
        }
        for row in (col + 1)..n {
            let factor = aug[[row, col]] / aug[[col, col]];
            for j in col..=n {
                aug[[row, j]] -= factor * aug[[col, j]];
            }
        }
    }

    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        if aug[[i, i]].abs() < 1e-10 {
            continue;
        }
        let mut sum = aug[[i, n]];
        for j in (i + 1)..n {
            sum -= aug[[i, j]] * x[j];
        }
        x[i] = sum / aug[[i, i]];
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic sine-plus-trend series
    fn signal(t: usize, phase: f64) -> f64 {
        (0.3 * t as f64 + phase).sin() * 5.0 + 0.1 * t as f64
    }

    fn training_batch(len: usize, context: usize, prediction: usize) -> Batch {
        let window = context + prediction;
        let n = len - window + 1;
        let mut past = Array3::<f64>::zeros((n, context, 2));
        let mut future = Array3::<f64>::zeros((n, prediction, 2));
        for w in 0..n {
            for t in 0..context {
                past[[w, t, 0]] = signal(w + t, 0.0);
                past[[w, t, 1]] = signal(w + t, 1.5);
            }
            for t in 0..prediction {
                future[[w, t, 0]] = signal(w + context + t, 0.0);
                future[[w, t, 1]] = signal(w + context + t, 1.5);
            }
        }
        let mut batch = Batch::new();
        batch.insert(batch::PAST_VALUES, BatchValue::Tensor(past.into_dyn()));
        batch.insert(batch::FUTURE_VALUES, BatchValue::Tensor(future.into_dyn()));
        batch
    }

    #[test]
    fn test_fit_and_forecast() {
        let mut model = LinearModel::new(6, 2).unwrap();
        model.fit(&training_batch(60, 6, 2)).unwrap();
        assert!(model.is_fitted());

        // a window the model has not seen, drawn from the same signal
        let start = 80;
        let mut past = Array3::<f64>::zeros((1, 6, 2));
        for t in 0..6 {
            past[[0, t, 0]] = signal(start + t, 0.0);
            past[[0, t, 1]] = signal(start + t, 1.5);
        }
        let mut inputs = Batch::new();
        inputs.insert(batch::PAST_VALUES, BatchValue::Tensor(past.into_dyn()));

        let outputs = model.forward(&inputs).unwrap();
        let prediction = outputs.tensor(batch::PREDICTION_OUTPUTS).unwrap();
        assert_eq!(prediction.shape(), &[1, 2, 2]);
        for p in 0..2 {
            assert!((prediction[[0, p, 0]] - signal(start + 6 + p, 0.0)).abs() < 1e-3);
            assert!((prediction[[0, p, 1]] - signal(start + 6 + p, 1.5)).abs() < 1e-3);
        }
    }

    #[test]
    fn test_forward_requires_fit() {
        let model = LinearModel::new(4, 2).unwrap();
        let mut inputs = Batch::new();
        inputs.insert(
            batch::PAST_VALUES,
            BatchValue::Tensor(Array3::<f64>::zeros((1, 4, 1)).into_dyn()),
        );
        assert!(model.forward(&inputs).is_err());
    }

    #[test]
    fn test_fit_rejects_geometry_mismatch() {
        let mut model = LinearModel::new(8, 2).unwrap();
        assert!(model.fit(&training_batch(30, 6, 2)).is_err());
    }

    #[test]
    fn test_forward_rejects_channel_mismatch() {
        let mut model = LinearModel::new(6, 2).unwrap();
        model.fit(&training_batch(40, 6, 2)).unwrap();
        let mut inputs = Batch::new();
        inputs.insert(
            batch::PAST_VALUES,
            BatchValue::Tensor(Array3::<f64>::zeros((1, 6, 3)).into_dyn()),
        );
        assert!(model.forward(&inputs).is_err());
    }

    #[test]
    fn test_solver_recovers_known_system() {
        let a = ndarray::array![[2.0, 0.0], [0.0, 4.0]];
        let b = ndarray::array![2.0, 8.0];
        let x = solve_linear_system(&a, &b);
        assert!((x[0] - 1.0).abs() < 1e-9);
        assert!((x[1] - 2.0).abs() < 1e-9);
    }
}

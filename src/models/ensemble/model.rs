//! Fixed-weight forecast combination.

use crate::error::{ForecastError, Result};

/// Combines forecasts as the elementwise weighted sum `sum_i w_i * f_i`.
///
/// Weights are used as given: they are not normalised and need not sum to one.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedEnsemble {
    weights: Vec<f64>,
}

impl WeightedEnsemble {
    /// Create an ensemble with one weight per member forecast.
    pub fn new(weights: Vec<f64>) -> Result<Self> {
        if weights.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "ensemble needs at least one weight".to_string(),
            ));
        }
        if let Some(w) = weights.iter().find(|w| !w.is_finite()) {
            return Err(ForecastError::InvalidParameter(format!(
                "ensemble weights must be finite, got {w}"
            )));
        }
        Ok(Self { weights })
    }

    /// Get the weights.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Get the number of members.
    pub fn member_count(&self) -> usize {
        self.weights.len()
    }

    /// Sum of the weights.
    pub fn total_weight(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Combine member forecasts, given in the same order as the weights.
    pub fn combine(&self, forecasts: &[&[f64]]) -> Result<Vec<f64>> {
        if forecasts.len() != self.weights.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.weights.len(),
                got: forecasts.len(),
            });
        }

        let horizon = forecasts[0].len();
        if let Some(other) = forecasts.iter().find(|f| f.len() != horizon) {
            return Err(ForecastError::DimensionMismatch {
                expected: horizon,
                got: other.len(),
            });
        }

        let mut combined = vec![0.0; horizon];
        for (forecast, w) in forecasts.iter().zip(&self.weights) {
            for (c, v) in combined.iter_mut().zip(forecast.iter()) {
                *c += w * v;
            }
        }
        Ok(combined)
    }
}

impl Default for WeightedEnsemble {
    /// Statistical model 0.4, neural model 0.6.
    fn default() -> Self {
        Self {
            weights: vec![0.4, 0.6],
        }
    }
}

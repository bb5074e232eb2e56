//! Feed-forward pieces of the recurrent regressor.

use ndarray::{Array2, Axis};
use rand::Rng;

use crate::error::{ForecastError, Result};
use crate::models::recurrent::lstm::glorot_uniform;

/// Fully connected layer `y = x W + b`.
#[derive(Debug, Clone)]
pub struct Dense {
    weights: Array2<f64>,
    bias: Array2<f64>,
}

/// Gradients of a [`Dense`] layer.
#[derive(Debug, Clone)]
pub struct DenseGradients {
    pub weights: Array2<f64>,
    pub bias: Array2<f64>,
}

impl Dense {
    /// Glorot-uniform weights and zero bias.
    pub fn new<R: Rng>(input_size: usize, output_size: usize, rng: &mut R) -> Self {
        Self {
            weights: glorot_uniform(input_size, output_size, rng),
            bias: Array2::zeros((1, output_size)),
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights.nrows()
    }

    pub fn output_size(&self) -> usize {
        self.weights.ncols()
    }

    pub fn forward(&self, x: &Array2<f64>) -> Array2<f64> {
        x.dot(&self.weights) + &self.bias
    }

    /// Gradients for upstream gradient `dy`, plus the gradient w.r.t. `x`.
    pub fn backward(&self, x: &Array2<f64>, dy: &Array2<f64>) -> (DenseGradients, Array2<f64>) {
        let grads = DenseGradients {
            weights: x.t().dot(dy),
            bias: dy.sum_axis(Axis(0)).insert_axis(Axis(0)),
        };
        (grads, dy.dot(&self.weights.t()))
    }

    pub fn parameters_mut(&mut self) -> Vec<&mut Array2<f64>> {
        vec![&mut self.weights, &mut self.bias]
    }
}

/// Inverted dropout: kept units are scaled by `1 / (1 - rate)` during
/// training so inference needs no rescaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dropout {
    rate: f64,
}

impl Dropout {
    pub fn new(rate: f64) -> Result<Self> {
        if !(0.0..1.0).contains(&rate) {
            return Err(ForecastError::InvalidParameter(format!(
                "dropout rate must be in [0, 1), got {rate}"
            )));
        }
        Ok(Self { rate })
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Sample a `(rows, cols)` mask of zeros and `1 / (1 - rate)`.
    pub fn mask<R: Rng>(&self, rows: usize, cols: usize, rng: &mut R) -> Array2<f64> {
        let keep = 1.0 / (1.0 - self.rate);
        if self.rate == 0.0 {
            return Array2::from_elem((rows, cols), 1.0);
        }
        Array2::from_shape_fn((rows, cols), |_| {
            if rng.gen::<f64>() < self.rate {
                0.0
            } else {
                keep
            }
        })
    }
}

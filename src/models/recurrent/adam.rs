//! Adam optimiser.
//!
//! # Reference
//!
//! Kingma, D. P., & Ba, J. (2015). Adam: A Method for Stochastic Optimization. ICLR.

use ndarray::{Array2, Zip};

use crate::error::{ForecastError, Result};

/// Adam with the bias correction folded into the step size:
///
/// `lr_t = lr * sqrt(1 - beta2^t) / (1 - beta1^t)`
/// `p -= lr_t * m / (sqrt(v) + epsilon)`
#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    iteration: u64,
    first_moment: Vec<Array2<f64>>,
    second_moment: Vec<Array2<f64>>,
}

impl Adam {
    /// Create an optimiser with `beta1 = 0.9`, `beta2 = 0.999`, `epsilon = 1e-7`.
    pub fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            iteration: 0,
            first_moment: Vec::new(),
            second_moment: Vec::new(),
        }
    }

    /// Set the moment decay rates.
    pub fn with_betas(mut self, beta1: f64, beta2: f64) -> Self {
        self.beta1 = beta1;
        self.beta2 = beta2;
        self
    }

    /// Set the denominator offset.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Number of updates applied so far.
    pub fn iterations(&self) -> u64 {
        self.iteration
    }

    /// Apply one update. `grads[i]` must match the shape of `params[i]`, and the
    /// parameter order must stay the same across calls.
    pub fn step(&mut self, params: &mut [&mut Array2<f64>], grads: &[Array2<f64>]) -> Result<()> {
        if params.len() != grads.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: params.len(),
                got: grads.len(),
            });
        }
        for (p, g) in params.iter().zip(grads) {
            if p.dim() != g.dim() {
                return Err(ForecastError::DimensionMismatch {
                    expected: p.len(),
                    got: g.len(),
                });
            }
        }
        if self.first_moment.is_empty() {
            self.first_moment = grads.iter().map(|g| Array2::zeros(g.raw_dim())).collect();
            self.second_moment = self.first_moment.clone();
        } else if self.first_moment.len() != grads.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.first_moment.len(),
                got: grads.len(),
            });
        }

        self.iteration += 1;
        let t = self.iteration as f64;
        let lr_t = self.learning_rate * (1.0 - self.beta2.powf(t)).sqrt() / (1.0 - self.beta1.powf(t));
        let (beta1, beta2, epsilon) = (self.beta1, self.beta2, self.epsilon);

        for (((param, grad), m), v) in params
            .iter_mut()
            .zip(grads)
            .zip(self.first_moment.iter_mut())
            .zip(self.second_moment.iter_mut())
        {
            Zip::from(&mut **param)
                .and(grad)
                .and(m)
                .and(v)
                .for_each(|p, &g, m, v| {
                    *m = beta1 * *m + (1.0 - beta1) * g;
                    *v = beta2 * *v + (1.0 - beta2) * g * g;
                    *p -= lr_t * *m / (v.sqrt() + epsilon);
                });
        }
        Ok(())
    }
}

//! Stacked LSTM regressor: LSTM layers with dropout, then a linear head.

use ndarray::{Array1, Array2};
use rand::Rng;

use crate::error::{ForecastError, Result};
use crate::models::recurrent::adam::Adam;
use crate::models::recurrent::layers::{Dense, Dropout};
use crate::models::recurrent::lstm::{LstmCache, LstmLayer};

/// `LSTM -> Dropout -> ... -> LSTM -> Dropout -> Dense(1)`.
///
/// Every layer except the last returns its full sequence; the last one
/// feeds only its final hidden state to the head.
#[derive(Debug, Clone)]
pub struct StackedLstm {
    layers: Vec<LstmLayer>,
    dropout: Dropout,
    head: Dense,
}

/// Split a `(batch, window)` matrix into `window` timesteps of shape `(batch, 1)`.
fn timesteps(inputs: &Array2<f64>) -> Vec<Array2<f64>> {
    inputs
        .columns()
        .into_iter()
        .map(|col| col.to_owned().insert_axis(ndarray::Axis(1)))
        .collect()
}

impl StackedLstm {
    /// Build a network with one LSTM layer per entry of `hidden`.
    pub fn new<R: Rng>(hidden: &[usize], dropout: f64, rng: &mut R) -> Result<Self> {
        if hidden.is_empty() || hidden.contains(&0) {
            return Err(ForecastError::InvalidParameter(format!(
                "hidden layer sizes must be non-empty and positive, got {hidden:?}"
            )));
        }
        let dropout = Dropout::new(dropout)?;

        let mut layers = Vec::with_capacity(hidden.len());
        let mut input_size = 1;
        for &size in hidden {
            layers.push(LstmLayer::new(input_size, size, rng));
            input_size = size;
        }
        let head = Dense::new(input_size, 1, rng);

        Ok(Self {
            layers,
            dropout,
            head,
        })
    }

    /// Hidden sizes from bottom to top.
    pub fn hidden_sizes(&self) -> Vec<usize> {
        self.layers.iter().map(LstmLayer::hidden_size).collect()
    }

    /// Parameters in a fixed order: each layer's kernel, recurrent kernel and
    /// bias, then the head's weights and bias.
    pub fn parameters_mut(&mut self) -> Vec<&mut Array2<f64>> {
        let mut params: Vec<&mut Array2<f64>> = self
            .layers
            .iter_mut()
            .flat_map(LstmLayer::parameters_mut)
            .collect();
        params.extend(self.head.parameters_mut());
        params
    }

    /// Predict one value per row of `inputs` (shape `(batch, window)`), dropout off.
    pub fn predict(&self, inputs: &Array2<f64>) -> Array1<f64> {
        let mut sequence = timesteps(inputs);
        for layer in &self.layers {
            sequence = layer.infer(&sequence);
        }
        match sequence.last() {
            Some(last) => self.head.forward(last).column(0).to_owned(),
            None => Array1::zeros(inputs.nrows()),
        }
    }

    /// Mean squared error of `predict(inputs)` against `targets`.
    pub fn loss(&self, inputs: &Array2<f64>, targets: &Array1<f64>) -> f64 {
        let pred = self.predict(inputs);
        (&pred - targets).mapv(|e| e * e).mean().unwrap_or(0.0)
    }

    /// Training-mode forward and backward pass over one batch.
    ///
    /// Returns the MSE loss and gradients in [`parameters_mut`](Self::parameters_mut) order.
    pub fn loss_and_gradients<R: Rng>(
        &self,
        inputs: &Array2<f64>,
        targets: &Array1<f64>,
        rng: &mut R,
    ) -> (f64, Vec<Array2<f64>>) {
        let batch = inputs.nrows();
        let depth = self.layers.len();

        let mut sequence = timesteps(inputs);
        let mut caches: Vec<LstmCache> = Vec::with_capacity(depth);
        let mut masks: Vec<Vec<Array2<f64>>> = Vec::with_capacity(depth);

        for (l, layer) in self.layers.iter().enumerate() {
            let (outputs, cache) = layer.forward(&sequence);
            caches.push(cache);
            let size = layer.hidden_size();
            if l + 1 < depth {
                let layer_masks: Vec<Array2<f64>> = outputs
                    .iter()
                    .map(|_| self.dropout.mask(batch, size, rng))
                    .collect();
                sequence = outputs
                    .iter()
                    .zip(&layer_masks)
                    .map(|(h, m)| h * m)
                    .collect();
                masks.push(layer_masks);
            } else {
                sequence = outputs;
                masks.push(vec![self.dropout.mask(batch, size, rng)]);
            }
        }

        let steps = sequence.len();
        let final_mask = &masks[depth - 1][0];
        let features = &sequence[steps - 1] * final_mask;
        let pred = self.head.forward(&features).column(0).to_owned();

        let error = &pred - targets;
        let loss = error.mapv(|e| e * e).mean().unwrap_or(0.0);
        let d_pred = (error * (2.0 / batch as f64)).insert_axis(ndarray::Axis(1));

        let (head_grads, d_features) = self.head.backward(&features, &d_pred);

        let top_hidden = self.layers[depth - 1].hidden_size();
        let mut d_outputs: Vec<Array2<f64>> = vec![Array2::zeros((batch, top_hidden)); steps];
        d_outputs[steps - 1] = d_features * final_mask;

        let mut layer_grads = Vec::with_capacity(depth);
        for l in (0..depth).rev() {
            let (grads, d_inputs) = self.layers[l].backward(&caches[l], &d_outputs);
            layer_grads.push(grads);
            if l > 0 {
                d_outputs = d_inputs
                    .iter()
                    .zip(&masks[l - 1])
                    .map(|(d, m)| d * m)
                    .collect();
            }
        }

        let mut gradients: Vec<Array2<f64>> = layer_grads
            .into_iter()
            .rev()
            .flat_map(|g| g.into_vec())
            .collect();
        gradients.push(head_grads.weights);
        gradients.push(head_grads.bias);

        (loss, gradients)
    }

    /// One optimiser step on a batch; returns the batch loss before the update.
    pub fn train_batch<R: Rng>(
        &mut self,
        inputs: &Array2<f64>,
        targets: &Array1<f64>,
        optimizer: &mut Adam,
        rng: &mut R,
    ) -> Result<f64> {
        if inputs.nrows() != targets.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: inputs.nrows(),
                got: targets.len(),
            });
        }
        if inputs.nrows() == 0 || inputs.ncols() == 0 {
            return Err(ForecastError::EmptyData);
        }

        let (loss, gradients) = self.loss_and_gradients(inputs, targets, rng);
        optimizer.step(&mut self.parameters_mut(), &gradients)?;
        Ok(loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn toy_batch() -> (Array2<f64>, Array1<f64>) {
        let inputs = array![
            [0.1, 0.2, 0.3, 0.4],
            [0.5, 0.4, 0.3, 0.2],
            [0.9, 0.1, 0.5, 0.7]
        ];
        let targets = array![0.5, 0.1, 0.6];
        (inputs, targets)
    }

    #[test]
    fn prediction_shape() {
        let mut rng = StdRng::seed_from_u64(42);
        let net = StackedLstm::new(&[8, 8, 4], 0.25, &mut rng).unwrap();
        let (inputs, _) = toy_batch();
        let pred = net.predict(&inputs);
        assert_eq!(pred.len(), 3);
        assert!(pred.iter().all(|v| v.is_finite()));
        assert_eq!(net.hidden_sizes(), vec![8, 8, 4]);
    }

    #[test]
    fn parameter_count_and_order() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut net = StackedLstm::new(&[6, 3], 0.0, &mut rng).unwrap();
        let shapes: Vec<(usize, usize)> = net.parameters_mut().iter().map(|p| p.dim()).collect();
        assert_eq!(
            shapes,
            vec![(1, 24), (6, 24), (1, 24), (6, 12), (3, 12), (1, 12), (3, 1), (1, 1)]
        );
    }

    #[test]
    fn gradients_match_finite_differences_without_dropout() {
        let mut rng = StdRng::seed_from_u64(17);
        let net = StackedLstm::new(&[3, 2], 0.0, &mut rng).unwrap();
        let (inputs, targets) = toy_batch();

        let (loss, gradients) = net.loss_and_gradients(&inputs, &targets, &mut rng);
        assert_relative_eq!(loss, net.loss(&inputs, &targets), epsilon = 1e-12);

        let eps = 1e-6;
        for (p, grad) in gradients.iter().enumerate() {
            let idx = (grad.nrows() - 1, grad.ncols() / 2);
            let mut plus = net.clone();
            plus.parameters_mut()[p][idx] += eps;
            let mut minus = net.clone();
            minus.parameters_mut()[p][idx] -= eps;
            let numeric = (plus.loss(&inputs, &targets) - minus.loss(&inputs, &targets)) / (2.0 * eps);
            assert_relative_eq!(grad[idx], numeric, epsilon = 1e-6);
        }
    }

    #[test]
    fn training_reduces_loss() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut net = StackedLstm::new(&[8, 4], 0.0, &mut rng).unwrap();
        let (inputs, targets) = toy_batch();
        let mut adam = Adam::new(0.01);

        let before = net.loss(&inputs, &targets);
        for _ in 0..200 {
            net.train_batch(&inputs, &targets, &mut adam, &mut rng).unwrap();
        }
        assert!(net.loss(&inputs, &targets) < before * 0.5);
    }

    #[test]
    fn invalid_architecture() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(StackedLstm::new(&[], 0.1, &mut rng).is_err());
        assert!(StackedLstm::new(&[4, 0], 0.1, &mut rng).is_err());
        assert!(StackedLstm::new(&[4], 1.0, &mut rng).is_err());
    }

    #[test]
    fn batch_shape_mismatch() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut net = StackedLstm::new(&[2], 0.0, &mut rng).unwrap();
        let mut adam = Adam::new(0.001);
        let (inputs, _) = toy_batch();
        assert!(matches!(
            net.train_batch(&inputs, &array![1.0], &mut adam, &mut rng),
            Err(ForecastError::DimensionMismatch { .. })
        ));
    }
}

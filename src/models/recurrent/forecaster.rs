//! One-step-ahead sequence forecaster built on [`StackedLstm`].

use log::{debug, info};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{ForecastError, Result};
use crate::models::recurrent::adam::Adam;
use crate::models::recurrent::network::StackedLstm;
use crate::transform::{MinMaxScaler, WindowDataset};

/// Hyper-parameters of the sequence forecaster.
#[derive(Debug, Clone, PartialEq)]
pub struct LstmConfig {
    /// Input window length.
    pub window: usize,
    /// Hidden units per LSTM layer, bottom to top.
    pub hidden: Vec<usize>,
    /// Dropout rate after every LSTM layer.
    pub dropout: f64,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    /// Seed for initialisation, dropout masks and shuffling.
    pub seed: u64,
}

impl Default for LstmConfig {
    fn default() -> Self {
        Self {
            window: 30,
            hidden: vec![128, 128, 64],
            dropout: 0.25,
            epochs: 70,
            batch_size: 32,
            learning_rate: 0.001,
            seed: 42,
        }
    }
}

impl LstmConfig {
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn with_hidden(mut self, hidden: Vec<usize>) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn with_dropout(mut self, dropout: f64) -> Self {
        self.dropout = dropout;
        self
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check the values that the network constructor does not.
    pub fn validate(&self) -> Result<()> {
        if self.window == 0 {
            return Err(ForecastError::InvalidParameter(
                "window must be positive".to_string(),
            ));
        }
        if self.epochs == 0 || self.batch_size == 0 {
            return Err(ForecastError::InvalidParameter(format!(
                "epochs and batch size must be positive, got {} and {}",
                self.epochs, self.batch_size
            )));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

/// Output of [`SequenceForecaster::fit_predict`].
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceForecast {
    /// One prediction per test window, in original units.
    pub predictions: Vec<f64>,
    /// Mean training loss per epoch on the scaled data.
    pub loss_history: Vec<f64>,
}

/// Windowed LSTM regressor producing one-step-ahead predictions.
///
/// The scaler is fitted on the whole series before windowing, so test
/// observations contribute to the min/max used during training.
#[derive(Debug, Clone)]
pub struct SequenceForecaster {
    config: LstmConfig,
    scaler: Option<MinMaxScaler>,
    network: Option<StackedLstm>,
    loss_history: Vec<f64>,
}

fn batch_matrix(data: &WindowDataset, indices: &[usize]) -> (Array2<f64>, Array1<f64>) {
    let window = data.window();
    let inputs = Array2::from_shape_fn((indices.len(), window), |(r, c)| {
        data.inputs()[indices[r]][c]
    });
    let targets = indices.iter().map(|&i| data.targets()[i]).collect();
    (inputs, targets)
}

impl SequenceForecaster {
    pub fn new(config: LstmConfig) -> Self {
        Self {
            config,
            scaler: None,
            network: None,
            loss_history: Vec::new(),
        }
    }

    pub fn config(&self) -> &LstmConfig {
        &self.config
    }

    /// Per-epoch training loss of the last fit.
    pub fn loss_history(&self) -> &[f64] {
        &self.loss_history
    }

    pub fn is_fitted(&self) -> bool {
        self.network.is_some()
    }

    /// Scale `series`, train on the windows whose target lies before
    /// `train_size`, and predict the rest.
    pub fn fit_predict(&mut self, series: &[f64], train_size: usize) -> Result<SequenceForecast> {
        self.config.validate()?;

        let scaler = MinMaxScaler::fit(series)?;
        let scaled = scaler.transform(series);
        let dataset = WindowDataset::build(&scaled, self.config.window)?;
        let (train, test) = dataset.split_for_train_size(train_size)?;
        if train.is_empty() {
            return Err(ForecastError::InsufficientData {
                needed: self.config.window + 1,
                got: train_size,
            });
        }
        info!(
            "LSTM: {} training windows, {} test windows (window {})",
            train.len(),
            test.len(),
            self.config.window
        );

        self.scaler = Some(scaler);
        self.train(&train)?;
        let scaled_predictions = self.predict_scaled(&test)?;

        Ok(SequenceForecast {
            predictions: scaler.inverse_transform(&scaled_predictions),
            loss_history: self.loss_history.clone(),
        })
    }

    /// Train a fresh network on already scaled windows.
    pub fn train(&mut self, data: &WindowDataset) -> Result<()> {
        self.config.validate()?;
        if data.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if data.window() != self.config.window {
            return Err(ForecastError::DimensionMismatch {
                expected: self.config.window,
                got: data.window(),
            });
        }

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut network = StackedLstm::new(&self.config.hidden, self.config.dropout, &mut rng)?;
        let mut optimizer = Adam::new(self.config.learning_rate);
        let mut order: Vec<usize> = (0..data.len()).collect();
        self.loss_history = Vec::with_capacity(self.config.epochs);

        for epoch in 0..self.config.epochs {
            order.shuffle(&mut rng);
            let mut weighted_loss = 0.0;
            for chunk in order.chunks(self.config.batch_size) {
                let (inputs, targets) = batch_matrix(data, chunk);
                let loss = network.train_batch(&inputs, &targets, &mut optimizer, &mut rng)?;
                weighted_loss += loss * chunk.len() as f64;
            }
            let epoch_loss = weighted_loss / data.len() as f64;
            if !epoch_loss.is_finite() {
                return Err(ForecastError::ComputationError(format!(
                    "training loss became non-finite at epoch {}",
                    epoch + 1
                )));
            }
            debug!("epoch {}/{}: loss {:.6}", epoch + 1, self.config.epochs, epoch_loss);
            self.loss_history.push(epoch_loss);
        }

        if let Some(last) = self.loss_history.last() {
            info!(
                "LSTM trained for {} epochs ({} updates), final loss {:.6}",
                self.config.epochs,
                optimizer.iterations(),
                last
            );
        }
        self.network = Some(network);
        Ok(())
    }

    /// Predict scaled targets for every window in `data`.
    pub fn predict_scaled(&self, data: &WindowDataset) -> Result<Vec<f64>> {
        let network = self.network.as_ref().ok_or(ForecastError::FitRequired)?;
        if data.is_empty() {
            return Ok(Vec::new());
        }
        let indices: Vec<usize> = (0..data.len()).collect();
        let (inputs, _) = batch_matrix(data, &indices);
        let predictions = network.predict(&inputs).to_vec();
        if predictions.iter().any(|p| !p.is_finite()) {
            return Err(ForecastError::ComputationError(
                "LSTM produced non-finite predictions".to_string(),
            ));
        }
        Ok(predictions)
    }

    /// Predict windows of raw values, scaling in and out with the fitted scaler.
    pub fn predict(&self, data: &WindowDataset) -> Result<Vec<f64>> {
        let scaler = self.scaler.ok_or(ForecastError::FitRequired)?;
        let scaled_inputs: Vec<f64> = data
            .inputs()
            .iter()
            .flat_map(|w| scaler.transform(w))
            .collect();
        let scaled = Array2::from_shape_vec((data.len(), data.window()), scaled_inputs)
            .map_err(|e| ForecastError::ComputationError(e.to_string()))?;
        let network = self.network.as_ref().ok_or(ForecastError::FitRequired)?;
        let predictions = network.predict(&scaled).to_vec();
        Ok(scaler.inverse_transform(&predictions))
    }
}

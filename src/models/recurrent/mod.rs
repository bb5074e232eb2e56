//! Recurrent neural network regressor for one-step-ahead forecasting.
//!
//! The network is a stack of LSTM layers, each followed by inverted dropout,
//! topped by a single linear unit. Training uses backpropagation through time,
//! mean squared error and the Adam optimiser on mini-batches of sliding
//! windows.
//!
//! # Example
//!
//! ```
//! use salescast::models::recurrent::{LstmConfig, SequenceForecaster};
//!
//! let series: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.7).sin() * 10.0).collect();
//! let config = LstmConfig::default()
//!     .with_window(5)
//!     .with_hidden(vec![4])
//!     .with_epochs(2);
//!
//! let mut model = SequenceForecaster::new(config);
//! let result = model.fit_predict(&series, 32).unwrap();
//! assert_eq!(result.predictions.len(), 8);
//! ```

mod adam;
mod forecaster;
mod layers;
mod lstm;
mod network;

pub use adam::Adam;
pub use forecaster::{LstmConfig, SequenceForecast, SequenceForecaster};
pub use layers::{Dense, DenseGradients, Dropout};
pub use lstm::{LstmCache, LstmGradients, LstmLayer};
pub use network::StackedLstm;

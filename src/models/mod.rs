//! Forecasting models.

mod traits;

pub mod ensemble;
pub mod recurrent;
pub mod sarima;

pub use ensemble::WeightedEnsemble;
pub use recurrent::{LstmConfig, SequenceForecaster};
pub use sarima::{SARIMASpec, SARIMA};
pub use traits::Forecaster;

//! Ensemble forecasting.
//!
//! Blends forecasts from several models with fixed weights.

mod model;

pub use model::WeightedEnsemble;

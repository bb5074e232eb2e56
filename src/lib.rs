//! # salescast
//!
//! Daily sales forecasting with a weighted SARIMA + LSTM ensemble.
//!
//! A run loads a CSV of sales rows, sums them per day, holds out the last
//! 20% of days, and forecasts the hold-out with a seasonal ARIMA model and a
//! stacked LSTM regressor. The two forecasts are blended 0.4 / 0.6 and scored
//! with regression metrics, above/below-mean classification metrics, ROC and
//! residual diagnostics. Charts are written as SVG.

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]
#![allow(clippy::needless_range_loop)]

pub mod core;
pub mod data;
pub mod error;
pub mod evaluation;
pub mod features;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod transform;
pub mod utils;
pub mod validation;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::core::{Forecast, TimeSeries};
    pub use crate::data::{load_daily_totals, train_test_split, LoaderConfig};
    pub use crate::error::{ForecastError, Result};
    pub use crate::evaluation::{calculate_metrics, evaluate, AccuracyMetrics, Evaluation};
    pub use crate::models::{
        Forecaster, LstmConfig, SARIMASpec, SequenceForecaster, WeightedEnsemble, SARIMA,
    };
    pub use crate::pipeline::{Pipeline, PipelineConfig, PipelineOutcome};
    pub use crate::utils::quantile_normal;
}

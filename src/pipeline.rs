//! End-to-end forecasting run: load, split, fit both models, blend, score.
//!
//! # Example
//!
//! ```no_run
//! use salescast::pipeline::{Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::default()
//!     .with_input("sales_data.csv")
//!     .with_output_dir("charts");
//! let outcome = Pipeline::new(config).run().unwrap();
//! println!("R2 = {:.4}", outcome.evaluation.regression.r_squared);
//! ```

use std::path::{Path, PathBuf};

use log::info;

use crate::core::{Forecast, TimeSeries};
use crate::data::{load_daily_totals, train_test_split, LoaderConfig, TrainTestSplit};
use crate::error::Result;
use crate::evaluation::{evaluate, Evaluation};
use crate::models::{Forecaster, LstmConfig, SARIMASpec, SequenceForecaster, WeightedEnsemble, SARIMA};
use crate::report::{write_report, ReportData, BAND_LEVEL};
use crate::validation::{ljung_box, LjungBoxResult};

/// Settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Input CSV path.
    pub input: PathBuf,
    pub loader: LoaderConfig,
    /// Fraction of observations used for training.
    pub train_fraction: f64,
    pub sarima: SARIMASpec,
    pub lstm: LstmConfig,
    /// Ensemble weights, SARIMA first.
    pub weights: Vec<f64>,
    /// Maximum lag of the diagnostic correlograms.
    pub lags: usize,
    /// Where charts and `forecasts.csv` go; `None` skips the report.
    pub output_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("sales_data.csv"),
            loader: LoaderConfig::default(),
            train_fraction: 0.8,
            sarima: SARIMASpec::default(),
            lstm: LstmConfig::default(),
            weights: vec![0.4, 0.6],
            lags: 30,
            output_dir: None,
        }
    }
}

impl PipelineConfig {
    pub fn with_input(mut self, path: impl Into<PathBuf>) -> Self {
        self.input = path.into();
        self
    }

    pub fn with_loader(mut self, loader: LoaderConfig) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_train_fraction(mut self, fraction: f64) -> Self {
        self.train_fraction = fraction;
        self
    }

    pub fn with_sarima(mut self, spec: SARIMASpec) -> Self {
        self.sarima = spec;
        self
    }

    pub fn with_lstm(mut self, config: LstmConfig) -> Self {
        self.lstm = config;
        self
    }

    /// Weights for the SARIMA and LSTM forecasts.
    pub fn with_weights(mut self, sarima: f64, lstm: f64) -> Self {
        self.weights = vec![sarima, lstm];
        self
    }

    pub fn with_lags(mut self, lags: usize) -> Self {
        self.lags = lags;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn without_output(mut self) -> Self {
        self.output_dir = None;
        self
    }
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Daily totals as loaded.
    pub series: TimeSeries,
    pub split: TrainTestSplit,
    /// SARIMA forecast over the test horizon, with 95% intervals.
    pub sarima: Forecast,
    /// SARIMA Akaike information criterion on the training set.
    pub sarima_aic: Option<f64>,
    /// LSTM predictions for the test windows.
    pub lstm: Vec<f64>,
    /// Per-epoch LSTM training loss.
    pub loss_history: Vec<f64>,
    pub ensemble: Vec<f64>,
    /// Decision threshold: the training mean.
    pub threshold: f64,
    pub evaluation: Evaluation,
    /// Ljung-Box test of the ensemble residuals.
    pub ljung_box: LjungBoxResult,
    /// Files written by the reporter, in order.
    pub artifacts: Vec<PathBuf>,
}

impl PipelineOutcome {
    /// Test-period actual values.
    pub fn actual(&self) -> &[f64] {
        self.split.test.primary_values()
    }

    /// Ensemble residuals over the test period.
    pub fn residuals(&self) -> Vec<f64> {
        self.actual()
            .iter()
            .zip(&self.ensemble)
            .map(|(a, e)| a - e)
            .collect()
    }
}

/// A configured run.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load the configured input file and run every stage on it.
    pub fn run(&self) -> Result<PipelineOutcome> {
        let series = load_daily_totals(&self.config.input, &self.config.loader)?;
        self.run_on(series)
    }

    /// Run every stage on an already loaded series. Any failure aborts the run.
    pub fn run_on(&self, series: TimeSeries) -> Result<PipelineOutcome> {
        let config = &self.config;
        let ensemble_model = WeightedEnsemble::new(config.weights.clone())?;

        let split = train_test_split(&series, config.train_fraction)?;
        let horizon = split.test_size();
        info!(
            "split {} observations: {} train, {} test",
            series.len(),
            split.train_size(),
            horizon
        );

        let mut sarima_model = SARIMA::from_spec(config.sarima);
        sarima_model.fit(&split.train)?;
        let sarima = sarima_model.predict_with_intervals(horizon, BAND_LEVEL)?;
        info!(
            "{} forecast {} steps (AIC {})",
            config.sarima,
            sarima.horizon(),
            sarima_model
                .aic()
                .map_or_else(|| "n/a".to_string(), |aic| format!("{aic:.2}"))
        );

        let mut lstm_model = SequenceForecaster::new(config.lstm.clone());
        let lstm = lstm_model.fit_predict(series.primary_values(), split.train_size())?;
        info!("LSTM forecast {} steps", lstm.predictions.len());

        let ensemble = ensemble_model.combine(&[sarima.primary(), &lstm.predictions])?;

        let threshold = split.train.mean();
        let actual = split.test.primary_values();
        let evaluation = evaluate(actual, &ensemble, threshold)?;
        info!(
            "ensemble R2 {:.4}, MSE {:.4}, accuracy {:.4}",
            evaluation.regression.r_squared,
            evaluation.regression.mse,
            evaluation.classification.accuracy
        );

        let residuals: Vec<f64> = actual.iter().zip(&ensemble).map(|(a, e)| a - e).collect();
        let ljung_box = ljung_box(&residuals, None, 0);
        info!("Ljung-Box on ensemble residuals: {ljung_box}");

        let artifacts = match &config.output_dir {
            Some(dir) => self.report(
                dir,
                &series,
                &split,
                sarima.primary(),
                &lstm.predictions,
                &ensemble,
                &evaluation,
            )?,
            None => Vec::new(),
        };

        Ok(PipelineOutcome {
            sarima_aic: sarima_model.aic(),
            series,
            split,
            sarima,
            lstm: lstm.predictions,
            loss_history: lstm.loss_history,
            ensemble,
            threshold,
            evaluation,
            ljung_box,
            artifacts,
        })
    }

    fn report(
        &self,
        dir: &Path,
        series: &TimeSeries,
        split: &TrainTestSplit,
        sarima: &[f64],
        lstm: &[f64],
        ensemble: &[f64],
        evaluation: &Evaluation,
    ) -> Result<Vec<PathBuf>> {
        let data = ReportData {
            history_dates: series.timestamps(),
            history: series.primary_values(),
            dates: split.test.timestamps(),
            actual: split.test.primary_values(),
            sarima,
            lstm,
            ensemble,
            train: split.train.primary_values(),
            evaluation,
            lags: self.config.lags,
        };
        write_report(dir, &data)
    }
}

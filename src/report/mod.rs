//! Chart and CSV output for a finished forecast run.
//!
//! Charts are plain SVG documents built by [`svg::SvgDocument`]; the forecast
//! table is written with the `csv` crate.

pub mod charts;
pub mod export;
pub mod svg;

pub use export::{export_forecasts, write_forecasts, ForecastTable};
pub use svg::SvgDocument;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::error::{ForecastError, Result};
use crate::evaluation::Evaluation;
use charts::{LineSeries, ACTUAL_COLOR, ENSEMBLE_COLOR, LSTM_COLOR, SARIMA_COLOR};

/// Confidence level for correlogram bands.
pub const BAND_LEVEL: f64 = 0.95;

/// Everything the reporter draws from.
#[derive(Debug, Clone, Copy)]
pub struct ReportData<'a> {
    /// Dates of the full series, training and test.
    pub history_dates: &'a [DateTime<Utc>],
    /// Values of the full series.
    pub history: &'a [f64],
    /// Test dates, one per forecast value.
    pub dates: &'a [DateTime<Utc>],
    pub actual: &'a [f64],
    pub sarima: &'a [f64],
    pub lstm: &'a [f64],
    pub ensemble: &'a [f64],
    /// Training values, for the ACF/PACF chart.
    pub train: &'a [f64],
    pub evaluation: &'a Evaluation,
    /// Maximum correlogram lag before clamping to the series length.
    pub lags: usize,
}

impl ReportData<'_> {
    fn table(&self) -> ForecastTable<'_> {
        ForecastTable {
            dates: self.dates,
            actual: self.actual,
            sarima: self.sarima,
            lstm: self.lstm,
            ensemble: self.ensemble,
        }
    }

    /// Ensemble residuals `actual - ensemble`.
    pub fn residuals(&self) -> Result<Vec<f64>> {
        if self.actual.len() != self.ensemble.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.actual.len(),
                got: self.ensemble.len(),
            });
        }
        Ok(self
            .actual
            .iter()
            .zip(self.ensemble)
            .map(|(a, e)| a - e)
            .collect())
    }
}

/// Render every chart and the forecast CSV into `dir`, creating it if needed.
///
/// Returns the written paths in order. The ROC chart is skipped when the
/// evaluation has no ROC curve.
pub fn write_report(dir: &Path, data: &ReportData) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    let mut save = |name: &str, doc: SvgDocument| -> Result<()> {
        let path = dir.join(name);
        doc.save(&path)?;
        info!("wrote {}", path.display());
        written.push(path);
        Ok(())
    };

    let lines = [
        LineSeries {
            label: "Actual",
            dates: data.history_dates,
            values: data.history,
            color: ACTUAL_COLOR,
            dashed: false,
        },
        LineSeries {
            label: "SARIMA",
            dates: data.dates,
            values: data.sarima,
            color: SARIMA_COLOR,
            dashed: true,
        },
        LineSeries {
            label: "LSTM",
            dates: data.dates,
            values: data.lstm,
            color: LSTM_COLOR,
            dashed: true,
        },
        LineSeries {
            label: "Ensemble",
            dates: data.dates,
            values: data.ensemble,
            color: ENSEMBLE_COLOR,
            dashed: false,
        },
    ];
    save(
        "forecast_comparison.svg",
        charts::forecast_comparison(&lines),
    )?;
    save(
        "classification_metrics.svg",
        charts::classification_metrics(&data.evaluation.classification),
    )?;
    save(
        "residual_acf.svg",
        charts::residual_acf(&data.residuals()?, data.lags, BAND_LEVEL)?,
    )?;
    save(
        "train_acf_pacf.svg",
        charts::train_acf_pacf(data.train, data.lags, BAND_LEVEL)?,
    )?;
    save(
        "confusion_matrix.svg",
        charts::confusion_matrix(&data.evaluation.classification.confusion),
    )?;
    match &data.evaluation.roc {
        Some(roc) => save("roc_curve.svg", charts::roc_curve(roc))?,
        None => warn!("skipping roc_curve.svg: ROC curve undefined"),
    }

    let csv_path = dir.join("forecasts.csv");
    export_forecasts(&csv_path, &data.table())?;
    info!("wrote {}", csv_path.display());
    written.push(csv_path);

    Ok(written)
}

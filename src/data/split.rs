//! Chronological train/test partitioning.

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};

/// A series cut once into a training prefix and a testing suffix.
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    /// Observations before the cut.
    pub train: TimeSeries,
    /// Observations at and after the cut.
    pub test: TimeSeries,
}

impl TrainTestSplit {
    /// Number of training observations (the cut index).
    pub fn train_size(&self) -> usize {
        self.train.len()
    }

    /// Number of test observations.
    pub fn test_size(&self) -> usize {
        self.test.len()
    }
}

/// Cut index for `fraction` of `n` observations, truncated toward zero.
pub fn split_index(n: usize, fraction: f64) -> usize {
    (n as f64 * fraction).floor() as usize
}

/// Split `series` so the first `floor(fraction * n)` points form the training set.
///
/// No shuffling; both parts keep their chronological order.
pub fn train_test_split(series: &TimeSeries, fraction: f64) -> Result<TrainTestSplit> {
    if !(fraction > 0.0 && fraction < 1.0) {
        return Err(ForecastError::InvalidParameter(format!(
            "train fraction must be in (0, 1), got {fraction}"
        )));
    }

    let n = series.len();
    let cut = split_index(n, fraction);
    if cut == 0 || cut == n {
        return Err(ForecastError::InsufficientData {
            needed: (1.0 / fraction.min(1.0 - fraction)).ceil() as usize,
            got: n,
        });
    }

    Ok(TrainTestSplit {
        train: series.slice(0, cut)?,
        test: series.slice(cut, n)?,
    })
}

//! Sliding-window supervision pairs for sequence models.

use crate::error::{ForecastError, Result};

/// `(history, next value)` pairs cut from a series.
///
/// Window `i` holds `values[i..i + window]` and its target is `values[i + window]`,
/// so a series of length `n` yields `n - window` pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowDataset {
    window: usize,
    inputs: Vec<Vec<f64>>,
    targets: Vec<f64>,
}

impl WindowDataset {
    /// Build every window of length `window` over `series`.
    pub fn build(series: &[f64], window: usize) -> Result<Self> {
        if window == 0 {
            return Err(ForecastError::InvalidParameter(
                "window length must be positive".to_string(),
            ));
        }
        if series.len() <= window {
            return Err(ForecastError::InsufficientData {
                needed: window + 1,
                got: series.len(),
            });
        }

        let (inputs, targets) = series
            .windows(window + 1)
            .map(|w| (w[..window].to_vec(), w[window]))
            .unzip();

        Ok(Self {
            window,
            inputs,
            targets,
        })
    }

    /// Window length.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether the dataset has no pairs.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// History windows.
    pub fn inputs(&self) -> &[Vec<f64>] {
        &self.inputs
    }

    /// Next-value targets.
    pub fn targets(&self) -> &[f64] {
        &self.targets
    }

    /// Split the pairs at `index`: `[0, index)` and `[index, len)`.
    pub fn split_at(&self, index: usize) -> Result<(WindowDataset, WindowDataset)> {
        if index > self.len() {
            return Err(ForecastError::IndexOutOfBounds {
                index,
                size: self.len(),
            });
        }
        let head = WindowDataset {
            window: self.window,
            inputs: self.inputs[..index].to_vec(),
            targets: self.targets[..index].to_vec(),
        };
        let tail = WindowDataset {
            window: self.window,
            inputs: self.inputs[index..].to_vec(),
            targets: self.targets[index..].to_vec(),
        };
        Ok((head, tail))
    }

    /// Split at `train_size - window`, the boundary used against the raw
    /// training length.
    ///
    /// The target of the first test pair is `series[train_size]`, so the test
    /// part holds exactly `series_len - train_size` pairs.
    pub fn split_for_train_size(&self, train_size: usize) -> Result<(WindowDataset, WindowDataset)> {
        if train_size <= self.window {
            return Err(ForecastError::InsufficientData {
                needed: self.window + 1,
                got: train_size,
            });
        }
        self.split_at(train_size - self.window)
    }
}

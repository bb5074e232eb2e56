//! Directional (above/below threshold) scoring of forecasts.

use crate::error::{ForecastError, Result};

/// Label each value 1 if it is strictly above `threshold`, else 0.
pub fn binarize(values: &[f64], threshold: f64) -> Vec<u8> {
    values.iter().map(|&v| u8::from(v > threshold)).collect()
}

/// 2x2 confusion matrix for binary labels.
///
/// Laid out as `[[tn, fp], [fn, tp]]`: rows are actual classes, columns are
/// predicted classes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub tn: usize,
    pub fp: usize,
    pub fn_: usize,
    pub tp: usize,
}

impl ConfusionMatrix {
    /// Count label agreements. Any non-zero label counts as positive.
    pub fn from_labels(actual: &[u8], predicted: &[u8]) -> Result<Self> {
        if actual.len() != predicted.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: actual.len(),
                got: predicted.len(),
            });
        }
        let mut cm = Self::default();
        for (&a, &p) in actual.iter().zip(predicted) {
            match (a != 0, p != 0) {
                (false, false) => cm.tn += 1,
                (false, true) => cm.fp += 1,
                (true, false) => cm.fn_ += 1,
                (true, true) => cm.tp += 1,
            }
        }
        Ok(cm)
    }

    /// Total number of samples.
    pub fn total(&self) -> usize {
        self.tn + self.fp + self.fn_ + self.tp
    }

    /// Counts as `[[tn, fp], [fn, tp]]`.
    pub fn as_rows(&self) -> [[usize; 2]; 2] {
        [[self.tn, self.fp], [self.fn_, self.tp]]
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.tp + self.tn, self.total())
    }

    /// `tp / (tp + fp)`, 0 when nothing is predicted positive.
    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    /// `tp / (tp + fn)`, 0 when there are no actual positives.
    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    /// Harmonic mean of precision and recall, 0 when both are 0.
    pub fn f1(&self) -> f64 {
        ratio(2 * self.tp, 2 * self.tp + self.fp + self.fn_)
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Accuracy, precision, recall and F1 for one set of labels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub confusion: ConfusionMatrix,
}

impl ClassificationMetrics {
    pub fn from_confusion(confusion: ConfusionMatrix) -> Self {
        Self {
            accuracy: confusion.accuracy(),
            precision: confusion.precision(),
            recall: confusion.recall(),
            f1: confusion.f1(),
            confusion,
        }
    }

    /// `(name, value)` pairs in display order.
    pub fn named(&self) -> [(&'static str, f64); 4] {
        [
            ("Accuracy", self.accuracy),
            ("Precision", self.precision),
            ("Recall", self.recall),
            ("F1 Score", self.f1),
        ]
    }
}

/// Binarize both series at `threshold` and score the predicted labels.
pub fn classification_metrics(
    actual: &[f64],
    predicted: &[f64],
    threshold: f64,
) -> Result<ClassificationMetrics> {
    if actual.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    let confusion =
        ConfusionMatrix::from_labels(&binarize(actual, threshold), &binarize(predicted, threshold))?;
    Ok(ClassificationMetrics::from_confusion(confusion))
}

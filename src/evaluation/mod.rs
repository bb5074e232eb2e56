//! Forecast evaluation: error metrics, directional classification and ROC.
//!
//! Directional scoring labels every test point as "high" when it lies strictly
//! above a threshold (the training mean in the pipeline) and compares the
//! labels of the actual and forecast series.

pub mod classification;
pub mod regression;
pub mod roc;

pub use classification::{binarize, classification_metrics, ClassificationMetrics, ConfusionMatrix};
pub use regression::{calculate_metrics, mae, mse, rmse, AccuracyMetrics};
pub use roc::{roc_curve, trapezoid, RocCurve};

use log::warn;

use crate::error::{ForecastError, Result};

/// Every score computed for one forecast against the test set.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub regression: AccuracyMetrics,
    /// Threshold used to binarize both series.
    pub threshold: f64,
    pub classification: ClassificationMetrics,
    /// `None` when the actual labels contain a single class.
    pub roc: Option<RocCurve>,
}

impl Evaluation {
    /// Area under the ROC curve, if the curve is defined.
    pub fn auc(&self) -> Option<f64> {
        self.roc.as_ref().map(RocCurve::auc)
    }
}

/// Score `predicted` against `actual`, binarizing both at `threshold`.
///
/// The ROC curve uses the continuous predictions as scores. A test set with
/// only one actual class has no ROC curve; that is logged and reported as
/// `None` instead of failing the evaluation.
pub fn evaluate(actual: &[f64], predicted: &[f64], threshold: f64) -> Result<Evaluation> {
    let regression = calculate_metrics(actual, predicted)?;
    let classification = classification_metrics(actual, predicted, threshold)?;

    let roc = match roc_curve(&binarize(actual, threshold), predicted) {
        Ok(curve) => Some(curve),
        Err(ForecastError::InvalidParameter(reason)) => {
            warn!("ROC curve undefined: {reason}");
            None
        }
        Err(e) => return Err(e),
    };

    Ok(Evaluation {
        regression,
        threshold,
        classification,
        roc,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn full_evaluation() {
        let actual = [10.0, 30.0, 12.0, 40.0, 8.0, 35.0];
        let predicted = [14.0, 28.0, 18.0, 33.0, 11.0, 20.0];
        let eval = evaluate(&actual, &predicted, 20.0).unwrap();

        assert_eq!(eval.classification.confusion.total(), 6);
        assert_eq!(eval.classification.confusion.as_rows(), [[3, 0], [1, 2]]);
        assert_relative_eq!(eval.classification.precision, 1.0, epsilon = 1e-12);
        assert_relative_eq!(eval.classification.recall, 2.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(eval.auc().unwrap(), 1.0, epsilon = 1e-12);
        assert!(eval.regression.r_squared < 1.0);
    }

    #[test]
    fn single_class_has_no_roc() {
        let eval = evaluate(&[5.0, 6.0, 7.0], &[5.5, 6.5, 7.5], 1.0).unwrap();
        assert!(eval.roc.is_none());
        assert!(eval.auc().is_none());
        assert_eq!(eval.classification.accuracy, 1.0);
    }

    #[test]
    fn length_mismatch_is_fatal() {
        assert!(evaluate(&[1.0, 2.0], &[1.0], 1.5).is_err());
    }
}

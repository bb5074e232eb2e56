//! Receiver operating characteristic curve for continuous scores.

use crate::error::{ForecastError, Result};

/// ROC curve points, ordered by decreasing threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct RocCurve {
    /// False positive rate at each threshold.
    pub fpr: Vec<f64>,
    /// True positive rate at each threshold.
    pub tpr: Vec<f64>,
    /// Score thresholds; the first is `+inf` (nothing predicted positive).
    pub thresholds: Vec<f64>,
}

impl RocCurve {
    /// Area under the curve by the trapezoid rule.
    pub fn auc(&self) -> f64 {
        trapezoid(&self.fpr, &self.tpr)
    }

    /// Number of points on the curve.
    pub fn len(&self) -> usize {
        self.fpr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fpr.is_empty()
    }
}

/// Trapezoidal integral of `y` over `x`.
pub fn trapezoid(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[1] + ys[0]) / 2.0)
        .sum()
}

/// Compute the ROC curve of `scores` against binary `labels`.
///
/// One point per distinct score (highest first), with a leading `(0, 0)` at
/// threshold `+inf`. Points lying on a straight segment between their
/// neighbours are dropped. Both classes must be present.
pub fn roc_curve(labels: &[u8], scores: &[f64]) -> Result<RocCurve> {
    if labels.len() != scores.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: labels.len(),
            got: scores.len(),
        });
    }
    if labels.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    if scores.iter().any(|s| !s.is_finite()) {
        return Err(ForecastError::InvalidParameter(
            "ROC scores must be finite".to_string(),
        ));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    // stable sort keeps the input order among ties
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    // cumulative counts at the last index of each distinct score
    let mut tps = Vec::new();
    let mut fps = Vec::new();
    let mut thresholds = Vec::new();
    let mut tp = 0usize;
    for (rank, &idx) in order.iter().enumerate() {
        if labels[idx] != 0 {
            tp += 1;
        }
        let last_of_run = order
            .get(rank + 1)
            .is_none_or(|&next| scores[next] != scores[idx]);
        if last_of_run {
            tps.push(tp as f64);
            fps.push((rank + 1 - tp) as f64);
            thresholds.push(scores[idx]);
        }
    }

    let positives = tps.last().copied().unwrap_or(0.0);
    let negatives = fps.last().copied().unwrap_or(0.0);
    if positives == 0.0 || negatives == 0.0 {
        return Err(ForecastError::InvalidParameter(format!(
            "ROC needs both classes, got {positives} positives and {negatives} negatives"
        )));
    }

    let (tps, fps, thresholds) = drop_collinear(tps, fps, thresholds);

    let fpr = std::iter::once(0.0)
        .chain(fps.iter().map(|f| f / negatives))
        .collect();
    let tpr = std::iter::once(0.0)
        .chain(tps.iter().map(|t| t / positives))
        .collect();
    let thresholds = std::iter::once(f64::INFINITY).chain(thresholds).collect();

    Ok(RocCurve {
        fpr,
        tpr,
        thresholds,
    })
}

/// Keep the end points and every point where the curve changes direction.
fn drop_collinear(
    tps: Vec<f64>,
    fps: Vec<f64>,
    thresholds: Vec<f64>,
) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let n = tps.len();
    if n <= 2 {
        return (tps, fps, thresholds);
    }
    let keep: Vec<usize> = (0..n)
        .filter(|&i| {
            if i == 0 || i == n - 1 {
                return true;
            }
            let second_diff = |v: &[f64]| v[i + 1] - 2.0 * v[i] + v[i - 1];
            second_diff(&tps) != 0.0 || second_diff(&fps) != 0.0
        })
        .collect();
    (
        keep.iter().map(|&i| tps[i]).collect(),
        keep.iter().map(|&i| fps[i]).collect(),
        keep.iter().map(|&i| thresholds[i]).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn textbook_example() {
        let labels = [0, 0, 1, 1];
        let scores = [0.1, 0.4, 0.35, 0.8];
        let roc = roc_curve(&labels, &scores).unwrap();

        assert_eq!(roc.fpr, vec![0.0, 0.0, 0.5, 0.5, 1.0]);
        assert_eq!(roc.tpr, vec![0.0, 0.5, 0.5, 1.0, 1.0]);
        assert_eq!(roc.thresholds[0], f64::INFINITY);
        assert_eq!(&roc.thresholds[1..], &[0.8, 0.4, 0.35, 0.1]);
        assert_relative_eq!(roc.auc(), 0.75, epsilon = 1e-12);
    }

    #[test]
    fn perfect_separation() {
        let roc = roc_curve(&[0, 0, 1, 1], &[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_relative_eq!(roc.auc(), 1.0, epsilon = 1e-12);
        // (0.5, 1) lies between (0, 1) and (1, 1) and is removed
        assert_eq!(roc.tpr, vec![0.0, 0.5, 1.0, 1.0]);
        assert_eq!(roc.fpr, vec![0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn constant_scores_give_chance() {
        let roc = roc_curve(&[0, 1, 1, 0, 1], &[3.0; 5]).unwrap();
        assert_eq!(roc.len(), 2);
        assert_relative_eq!(roc.auc(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn single_class_is_undefined() {
        assert!(matches!(
            roc_curve(&[1, 1, 1], &[0.2, 0.5, 0.9]),
            Err(ForecastError::InvalidParameter(_))
        ));
        assert!(matches!(
            roc_curve(&[0, 0], &[0.2, 0.5]),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn input_validation() {
        assert!(matches!(roc_curve(&[], &[]), Err(ForecastError::EmptyData)));
        assert!(roc_curve(&[0, 1], &[0.5]).is_err());
        assert!(roc_curve(&[0, 1], &[0.5, f64::NAN]).is_err());
    }

    #[test]
    fn trapezoid_area() {
        assert_relative_eq!(trapezoid(&[0.0, 1.0], &[0.0, 1.0]), 0.5, epsilon = 1e-12);
        assert_eq!(trapezoid(&[0.0], &[1.0]), 0.0);
    }
}

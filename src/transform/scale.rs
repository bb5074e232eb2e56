//! Min-max scaling with an exact inverse.

use crate::error::{ForecastError, Result};

/// Affine map from the observed `[min, max]` onto a target range.
///
/// A zero-width input range is treated as width 1, so constant series
/// map to the lower end of the target range instead of dividing by zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMaxScaler {
    data_min: f64,
    data_max: f64,
    range_min: f64,
    range_max: f64,
}

impl MinMaxScaler {
    /// Fit a scaler mapping `series` onto `[0, 1]`.
    pub fn fit(series: &[f64]) -> Result<Self> {
        Self::fit_to_range(series, 0.0, 1.0)
    }

    /// Fit a scaler mapping `series` onto `[range_min, range_max]`.
    pub fn fit_to_range(series: &[f64], range_min: f64, range_max: f64) -> Result<Self> {
        if series.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if range_min >= range_max {
            return Err(ForecastError::InvalidParameter(format!(
                "feature range must be increasing, got [{range_min}, {range_max}]"
            )));
        }
        if series.iter().any(|x| !x.is_finite()) {
            return Err(ForecastError::InvalidParameter(
                "cannot scale non-finite values".to_string(),
            ));
        }

        let data_min = series.iter().copied().fold(f64::INFINITY, f64::min);
        let data_max = series.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Ok(Self {
            data_min,
            data_max,
            range_min,
            range_max,
        })
    }

    /// Smallest value seen during fitting.
    pub fn data_min(&self) -> f64 {
        self.data_min
    }

    /// Largest value seen during fitting.
    pub fn data_max(&self) -> f64 {
        self.data_max
    }

    fn scale(&self) -> f64 {
        let width = self.data_max - self.data_min;
        let width = if width < 1e-10 { 1.0 } else { width };
        (self.range_max - self.range_min) / width
    }

    /// Map a single value into the target range.
    pub fn transform_value(&self, x: f64) -> f64 {
        (x - self.data_min) * self.scale() + self.range_min
    }

    /// Map a single scaled value back to the original units.
    pub fn inverse_value(&self, x: f64) -> f64 {
        (x - self.range_min) / self.scale() + self.data_min
    }

    /// Transform `data` with the fitted parameters.
    pub fn transform(&self, data: &[f64]) -> Vec<f64> {
        data.iter().map(|&x| self.transform_value(x)).collect()
    }

    /// Undo [`transform`](Self::transform).
    pub fn inverse_transform(&self, data: &[f64]) -> Vec<f64> {
        data.iter().map(|&x| self.inverse_value(x)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn normalize_basic() {
        let series = vec![0.0, 25.0, 50.0, 75.0, 100.0];
        let scaler = MinMaxScaler::fit(&series).unwrap();
        let scaled = scaler.transform(&series);

        assert_relative_eq!(scaled[0], 0.0, epsilon = 1e-10);
        assert_relative_eq!(scaled[2], 0.5, epsilon = 1e-10);
        assert_relative_eq!(scaled[4], 1.0, epsilon = 1e-10);
    }

    #[test]
    fn normalize_negative_values() {
        let series = vec![-10.0, 0.0, 10.0];
        let scaled = MinMaxScaler::fit(&series).unwrap().transform(&series);

        assert_eq!(scaled, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn normalize_constant() {
        let series = vec![5.0; 10];
        let scaler = MinMaxScaler::fit(&series).unwrap();

        for x in scaler.transform(&series) {
            assert_relative_eq!(x, 0.0, epsilon = 1e-10);
        }
        assert_relative_eq!(scaler.inverse_value(0.0), 5.0, epsilon = 1e-10);
    }

    #[test]
    fn inverse_recovers_original_units() {
        let series = vec![812.0, 1033.0, 455.0, 2031.5];
        let scaler = MinMaxScaler::fit(&series).unwrap();
        let recovered = scaler.inverse_transform(&scaler.transform(&series));

        for (orig, rec) in series.iter().zip(recovered.iter()) {
            assert_relative_eq!(orig, rec, epsilon = 1e-9);
        }
    }

    #[test]
    fn custom_range() {
        let series = vec![0.0, 10.0];
        let scaler = MinMaxScaler::fit_to_range(&series, -1.0, 1.0).unwrap();
        assert_eq!(scaler.transform(&series), vec![-1.0, 1.0]);
        assert_eq!(scaler.transform_value(5.0), 0.0);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(MinMaxScaler::fit(&[]).unwrap_err(), ForecastError::EmptyData);
        assert!(MinMaxScaler::fit(&[1.0, f64::NAN]).is_err());
        assert!(MinMaxScaler::fit_to_range(&[1.0], 1.0, 0.0).is_err());
    }
}

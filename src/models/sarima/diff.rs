//! Differencing utilities for seasonal ARIMA models.

/// Apply `d` rounds of first differencing.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Apply `d` rounds of lag-`period` differencing.
///
/// # Arguments
/// * `series` - The input series
/// * `d` - Seasonal differencing order
/// * `period` - Seasonal period
pub fn seasonal_difference(series: &[f64], d: usize, period: usize) -> Vec<f64> {
    if period == 0 {
        return series.to_vec();
    }

    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= period {
            return Vec::new();
        }
        result = result
            .iter()
            .skip(period)
            .zip(result.iter())
            .map(|(curr, prev)| curr - prev)
            .collect();
    }
    result
}

/// Multiply two lag polynomials given as coefficient vectors (index = lag).
pub fn multiply_polynomials(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        if x == 0.0 {
            continue;
        }
        for (j, &y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// Coefficients of `(1 - B)^d (1 - B^period)^seasonal_d`, index = lag.
///
/// The result starts with `1.0` and has length `d + seasonal_d * period + 1`.
pub fn differencing_polynomial(d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..d {
        poly = multiply_polynomials(&poly, &[1.0, -1.0]);
    }
    if period > 0 {
        let mut seasonal = vec![0.0; period + 1];
        seasonal[0] = 1.0;
        seasonal[period] = -1.0;
        for _ in 0..seasonal_d {
            poly = multiply_polynomials(&poly, &seasonal);
        }
    }
    poly
}

/// Undo differencing for values that continue `history`.
///
/// `differenced` holds future values on the differenced scale; `history` is
/// the original (undifferenced) series they follow. Each output solves
/// `w_t = sum_k poly[k] * y_{t-k}` for `y_t`.
pub fn integrate(differenced: &[f64], history: &[f64], polynomial: &[f64]) -> Vec<f64> {
    let order = polynomial.len().saturating_sub(1);
    if order == 0 {
        return differenced.to_vec();
    }

    let mut extended = history.to_vec();
    let start = extended.len();
    for &w in differenced {
        let t = extended.len();
        let mut y = w;
        for k in 1..=order {
            if t >= k {
                y -= polynomial[k] * extended[t - k];
            }
        }
        extended.push(y);
    }
    extended.split_off(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn difference_orders() {
        let series = vec![1.0, 3.0, 6.0, 10.0, 15.0];
        assert_eq!(difference(&series, 0), series);
        assert_eq!(difference(&series, 1), vec![2.0, 3.0, 4.0, 5.0]);
        assert_eq!(difference(&series, 2), vec![1.0, 1.0, 1.0]);
        assert!(difference(&[], 1).is_empty());
    }

    #[test]
    fn seasonal_difference_basic() {
        // Quarterly data: every quarter grows by 10 year over year
        let series = vec![100.0, 120.0, 80.0, 90.0, 110.0, 130.0, 90.0, 100.0];
        let result = seasonal_difference(&series, 1, 4);
        assert_eq!(result, vec![10.0, 10.0, 10.0, 10.0]);
        assert_eq!(seasonal_difference(&series, 0, 4), series);
        assert!(seasonal_difference(&series[..4], 1, 4).is_empty());
    }

    #[test]
    fn polynomial_matches_sequential_differencing() {
        let series: Vec<f64> = (0..40)
            .map(|i| 50.0 + 0.7 * i as f64 + 5.0 * ((i % 12) as f64).sin() + (i * i) as f64 * 0.01)
            .collect();
        let poly = differencing_polynomial(1, 1, 12);
        assert_eq!(poly.len(), 14);

        let expected = seasonal_difference(&difference(&series, 1), 1, 12);
        let lag = poly.len() - 1;
        for (j, &e) in expected.iter().enumerate() {
            let t = j + lag;
            let w: f64 = poly.iter().enumerate().map(|(k, c)| c * series[t - k]).sum();
            assert_relative_eq!(w, e, epsilon = 1e-9);
        }
    }

    #[test]
    fn polynomial_product() {
        assert_eq!(multiply_polynomials(&[1.0, -1.0], &[1.0, -1.0]), vec![1.0, -2.0, 1.0]);
        assert!(multiply_polynomials(&[], &[1.0]).is_empty());
        assert_eq!(differencing_polynomial(0, 0, 12), vec![1.0]);
    }

    #[test]
    fn integrate_reverses_first_difference() {
        let history = vec![10.0, 12.0, 15.0, 19.0, 24.0];
        let poly = differencing_polynomial(1, 0, 0);
        let integrated = integrate(&[6.0, 7.0], &history, &poly);
        assert_relative_eq!(integrated[0], 30.0, epsilon = 1e-10);
        assert_relative_eq!(integrated[1], 37.0, epsilon = 1e-10);
    }

    #[test]
    fn integrate_reverses_seasonal_and_regular_difference() {
        let full: Vec<f64> = (0..36)
            .map(|i| 100.0 + 2.0 * i as f64 + 10.0 * ((i % 12) as f64 / 2.0).cos())
            .collect();
        let (history, future) = full.split_at(30);
        let poly = differencing_polynomial(1, 1, 12);
        let lag = poly.len() - 1;

        let future_diff: Vec<f64> = (30..36)
            .map(|t| poly.iter().enumerate().map(|(k, c)| c * full[t - k]).sum())
            .collect();
        assert_eq!(lag, 13);

        let recovered = integrate(&future_diff, history, &poly);
        for (r, f) in recovered.iter().zip(future) {
            assert_relative_eq!(r, f, epsilon = 1e-9);
        }
    }
}

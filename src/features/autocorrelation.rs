//! Sample autocorrelation and partial autocorrelation with confidence bands.

use crate::error::{ForecastError, Result};
use crate::utils::stats::{mean, quantile_normal};

/// Largest ACF lag a series of length `n` supports.
pub fn max_acf_lags(n: usize) -> usize {
    n.saturating_sub(1)
}

/// Largest PACF lag a series of length `n` supports.
pub fn max_pacf_lags(n: usize) -> usize {
    (n / 2).saturating_sub(1)
}

/// Biased autocovariances (divided by `n`) for lags `0..=nlags`.
fn autocovariance(series: &[f64], nlags: usize) -> Vec<f64> {
    let n = series.len() as f64;
    let m = mean(series);
    let centered: Vec<f64> = series.iter().map(|x| x - m).collect();
    (0..=nlags)
        .map(|k| {
            centered
                .iter()
                .skip(k)
                .zip(centered.iter())
                .map(|(a, b)| a * b)
                .sum::<f64>()
                / n
        })
        .collect()
}

/// Sample autocorrelation for lags `0..=nlags`; `acf[0] == 1`.
///
/// A constant series has zero autocorrelation at every positive lag.
pub fn acf(series: &[f64], nlags: usize) -> Result<Vec<f64>> {
    if series.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    if nlags > max_acf_lags(series.len()) {
        return Err(ForecastError::InvalidParameter(format!(
            "ACF of {} observations supports at most {} lags, got {nlags}",
            series.len(),
            max_acf_lags(series.len())
        )));
    }

    let acov = autocovariance(series, nlags);
    if acov[0] < 1e-12 {
        let mut flat = vec![0.0; nlags + 1];
        flat[0] = 1.0;
        return Ok(flat);
    }
    Ok(acov.iter().map(|c| c / acov[0]).collect())
}

/// Partial autocorrelation for lags `0..=nlags`; `pacf[0] == 1`.
///
/// Solves the Yule-Walker equations on the biased autocovariances with the
/// Durbin-Levinson recursion.
pub fn pacf(series: &[f64], nlags: usize) -> Result<Vec<f64>> {
    if series.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    if nlags > max_pacf_lags(series.len()) {
        return Err(ForecastError::InvalidParameter(format!(
            "PACF of {} observations supports at most {} lags, got {nlags}",
            series.len(),
            max_pacf_lags(series.len())
        )));
    }

    let r = acf(series, nlags)?;
    let mut result = vec![0.0; nlags + 1];
    result[0] = 1.0;
    if nlags == 0 {
        return Ok(result);
    }

    let mut phi = vec![0.0; nlags + 1];
    let mut prev = vec![0.0; nlags + 1];
    phi[1] = r[1];
    result[1] = r[1];
    let mut error = 1.0 - r[1] * r[1];

    for k in 2..=nlags {
        prev[..k].copy_from_slice(&phi[..k]);
        if error.abs() < 1e-12 {
            break;
        }
        let num = r[k] - (1..k).map(|j| prev[j] * r[k - j]).sum::<f64>();
        let reflection = num / error;
        phi[k] = reflection;
        for j in 1..k {
            phi[j] = prev[j] - reflection * prev[k - j];
        }
        error *= 1.0 - reflection * reflection;
        result[k] = reflection;
    }

    Ok(result)
}

/// Correlation coefficients by lag with a symmetric confidence band around zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Correlogram {
    /// Coefficient at each lag, starting at lag 0.
    pub values: Vec<f64>,
    /// Half-width of the band at each lag.
    pub band: Vec<f64>,
    /// Confidence level of the band.
    pub level: f64,
}

impl Correlogram {
    /// ACF with Bartlett's standard errors:
    /// `var[k] = (1 + 2 * sum_{j<k} r_j^2) / n`, with `var[0] = 0`.
    pub fn acf(series: &[f64], nlags: usize, level: f64) -> Result<Self> {
        let z = band_quantile(level)?;
        let values = acf(series, nlags)?;
        let n = series.len() as f64;

        let mut band = Vec::with_capacity(values.len());
        let mut cumulative = 0.0;
        for (k, r) in values.iter().enumerate() {
            let variance = match k {
                0 => 0.0,
                1 => 1.0 / n,
                _ => (1.0 + 2.0 * cumulative) / n,
            };
            if k >= 1 {
                cumulative += r * r;
            }
            band.push(z * variance.sqrt());
        }

        Ok(Self {
            values,
            band,
            level,
        })
    }

    /// PACF with standard error `1 / sqrt(n)` at every positive lag.
    pub fn pacf(series: &[f64], nlags: usize, level: f64) -> Result<Self> {
        let z = band_quantile(level)?;
        let values = pacf(series, nlags)?;
        let half = z / (series.len() as f64).sqrt();
        let band = (0..values.len())
            .map(|k| if k == 0 { 0.0 } else { half })
            .collect();

        Ok(Self {
            values,
            band,
            level,
        })
    }

    /// Highest lag shown.
    pub fn max_lag(&self) -> usize {
        self.values.len().saturating_sub(1)
    }

    /// Lags (excluding 0) whose coefficient falls outside the band.
    pub fn significant_lags(&self) -> Vec<usize> {
        self.values
            .iter()
            .zip(&self.band)
            .enumerate()
            .skip(1)
            .filter(|(_, (v, b))| v.abs() > **b)
            .map(|(k, _)| k)
            .collect()
    }
}

fn band_quantile(level: f64) -> Result<f64> {
    if !(level > 0.0 && level < 1.0) {
        return Err(ForecastError::InvalidParameter(format!(
            "confidence level must be in (0, 1), got {level}"
        )));
    }
    Ok(quantile_normal(0.5 + level / 2.0))
}

//! Seasonal ARIMA model estimated by conditional sum of squares.

use std::fmt;

use log::{debug, warn};

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::sarima::diff::{
    difference, differencing_polynomial, integrate, multiply_polynomials, seasonal_difference,
};
use crate::models::Forecaster;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::{mean, quantile_normal};

/// Coefficient bound keeping AR roots stationary and MA roots invertible in practice.
const COEFFICIENT_BOUND: f64 = 0.99;

/// SARIMA(p, d, q)(P, D, Q)\[s\] order specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SARIMASpec {
    /// Non-seasonal AR order (p)
    pub p: usize,
    /// Non-seasonal differencing order (d)
    pub d: usize,
    /// Non-seasonal MA order (q)
    pub q: usize,
    /// Seasonal AR order (P)
    pub cap_p: usize,
    /// Seasonal differencing order (D)
    pub cap_d: usize,
    /// Seasonal MA order (Q)
    pub cap_q: usize,
    /// Seasonal period (s)
    pub s: usize,
}

impl SARIMASpec {
    /// Create a new specification.
    pub fn new(
        p: usize,
        d: usize,
        q: usize,
        cap_p: usize,
        cap_d: usize,
        cap_q: usize,
        s: usize,
    ) -> Self {
        Self {
            p,
            d,
            q,
            cap_p,
            cap_d,
            cap_q,
            s,
        }
    }

    /// A plain ARIMA(p, d, q) specification.
    pub fn non_seasonal(p: usize, d: usize, q: usize) -> Self {
        Self::new(p, d, q, 0, 0, 0, 0)
    }

    /// Whether any seasonal term is active.
    pub fn is_seasonal(&self) -> bool {
        self.s > 1 && (self.cap_p > 0 || self.cap_d > 0 || self.cap_q > 0)
    }

    /// Highest AR lag of the expanded multiplicative polynomial.
    pub fn ar_order(&self) -> usize {
        self.p + self.cap_p * self.s
    }

    /// Highest MA lag of the expanded multiplicative polynomial.
    pub fn ma_order(&self) -> usize {
        self.q + self.cap_q * self.s
    }

    /// Observations consumed by differencing.
    pub fn differencing_order(&self) -> usize {
        self.d + self.cap_d * self.s
    }

    /// A mean term is estimated only for undifferenced models.
    pub fn include_mean(&self) -> bool {
        self.d == 0 && self.cap_d == 0
    }

    /// Number of estimated coefficients.
    pub fn num_params(&self) -> usize {
        self.p + self.q + self.cap_p + self.cap_q + usize::from(self.include_mean())
    }

    /// Minimum series length accepted by [`SARIMA::fit`].
    pub fn min_observations(&self) -> usize {
        self.differencing_order() + self.ar_order().max(self.ma_order()) + self.num_params() + 1
    }

    fn validate(&self) -> Result<()> {
        let seasonal_terms = self.cap_p + self.cap_d + self.cap_q;
        if seasonal_terms > 0 && self.s < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "seasonal orders require a period of at least 2, got {}",
                self.s
            )));
        }
        Ok(())
    }
}

impl Default for SARIMASpec {
    fn default() -> Self {
        Self::new(1, 1, 1, 1, 1, 1, 12)
    }
}

impl fmt::Display for SARIMASpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SARIMA({},{},{})", self.p, self.d, self.q)?;
        if self.is_seasonal() {
            write!(f, "({},{},{})[{}]", self.cap_p, self.cap_d, self.cap_q, self.s)?;
        }
        Ok(())
    }
}

/// Estimated coefficients in their factored form.
#[derive(Debug, Clone, Default, PartialEq)]
struct Coefficients {
    mean: f64,
    ar: Vec<f64>,
    ma: Vec<f64>,
    seasonal_ar: Vec<f64>,
    seasonal_ma: Vec<f64>,
}

impl Coefficients {
    /// Unpack `[mean?, ar.., ma.., sar.., sma..]`.
    fn from_params(spec: &SARIMASpec, params: &[f64]) -> Self {
        let mut rest = params;
        let mut take = |n: usize| {
            let (head, tail) = rest.split_at(n);
            rest = tail;
            head.to_vec()
        };
        let mean = if spec.include_mean() { take(1)[0] } else { 0.0 };
        Self {
            mean,
            ar: take(spec.p),
            ma: take(spec.q),
            seasonal_ar: take(spec.cap_p),
            seasonal_ma: take(spec.cap_q),
        }
    }

    /// `phi(B) Phi(B^s)` as `[1, -a_1, -a_2, ...]`.
    fn ar_polynomial(&self, s: usize) -> Vec<f64> {
        let regular: Vec<f64> = std::iter::once(1.0)
            .chain(self.ar.iter().map(|c| -c))
            .collect();
        let seasonal = seasonal_polynomial(&self.seasonal_ar, s, -1.0);
        multiply_polynomials(&regular, &seasonal)
    }

    /// `theta(B) Theta(B^s)` as `[1, m_1, m_2, ...]`.
    fn ma_polynomial(&self, s: usize) -> Vec<f64> {
        let regular: Vec<f64> = std::iter::once(1.0).chain(self.ma.iter().copied()).collect();
        let seasonal = seasonal_polynomial(&self.seasonal_ma, s, 1.0);
        multiply_polynomials(&regular, &seasonal)
    }

    /// Expanded AR and MA lag coefficients, both indexed from lag 1.
    fn expanded(&self, s: usize) -> (Vec<f64>, Vec<f64>) {
        let ar: Vec<f64> = self.ar_polynomial(s)[1..].iter().map(|c| -c).collect();
        let ma = self.ma_polynomial(s)[1..].to_vec();
        (ar, ma)
    }
}

fn seasonal_polynomial(coefficients: &[f64], s: usize, sign: f64) -> Vec<f64> {
    let mut poly = vec![0.0; coefficients.len() * s + 1];
    poly[0] = 1.0;
    for (j, c) in coefficients.iter().enumerate() {
        poly[(j + 1) * s] = sign * c;
    }
    poly
}

/// One-step innovations of the differenced series; zero before `ar.len()`.
fn innovations(w: &[f64], mean: f64, ar: &[f64], ma: &[f64]) -> Vec<f64> {
    let start = ar.len();
    let mut residuals = vec![0.0; w.len()];
    for t in start..w.len() {
        let mut pred = mean;
        for (k, a) in ar.iter().enumerate() {
            pred += a * (w[t - 1 - k] - mean);
        }
        for (k, m) in ma.iter().enumerate().take(t) {
            pred += m * residuals[t - 1 - k];
        }
        residuals[t] = w[t] - pred;
    }
    residuals
}

/// Seasonal ARIMA forecasting model.
///
/// The series is differenced `d` times at lag 1 and `D` times at lag `s`,
/// then a multiplicative ARMA(p, q)(P, Q)\[s\] is estimated by minimising
/// the conditional sum of squares with a bounded Nelder-Mead search.
#[derive(Debug, Clone)]
pub struct SARIMA {
    spec: SARIMASpec,
    coefficients: Coefficients,
    original: Option<Vec<f64>>,
    differenced: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
    fitted: Option<Vec<f64>>,
    residual_variance: Option<f64>,
    aic: Option<f64>,
    bic: Option<f64>,
    converged: bool,
}

impl SARIMA {
    /// Create a new SARIMA(p,d,q)(P,D,Q)\[s\] model.
    pub fn new(
        p: usize,
        d: usize,
        q: usize,
        cap_p: usize,
        cap_d: usize,
        cap_q: usize,
        s: usize,
    ) -> Self {
        Self::from_spec(SARIMASpec::new(p, d, q, cap_p, cap_d, cap_q, s))
    }

    /// Create a model from a specification.
    pub fn from_spec(spec: SARIMASpec) -> Self {
        Self {
            spec,
            coefficients: Coefficients::default(),
            original: None,
            differenced: None,
            residuals: None,
            fitted: None,
            residual_variance: None,
            aic: None,
            bic: None,
            converged: false,
        }
    }

    /// Get the model specification.
    pub fn spec(&self) -> SARIMASpec {
        self.spec
    }

    /// Non-seasonal AR coefficients.
    pub fn ar_coefficients(&self) -> &[f64] {
        &self.coefficients.ar
    }

    /// Non-seasonal MA coefficients.
    pub fn ma_coefficients(&self) -> &[f64] {
        &self.coefficients.ma
    }

    /// Seasonal AR coefficients.
    pub fn seasonal_ar_coefficients(&self) -> &[f64] {
        &self.coefficients.seasonal_ar
    }

    /// Seasonal MA coefficients.
    pub fn seasonal_ma_coefficients(&self) -> &[f64] {
        &self.coefficients.seasonal_ma
    }

    /// Mean of the differenced series (zero when differencing is applied).
    pub fn mean(&self) -> f64 {
        self.coefficients.mean
    }

    /// Innovation variance.
    pub fn residual_variance(&self) -> Option<f64> {
        self.residual_variance
    }

    /// Get AIC.
    pub fn aic(&self) -> Option<f64> {
        self.aic
    }

    /// Get BIC.
    pub fn bic(&self) -> Option<f64> {
        self.bic
    }

    /// Whether the optimiser met its tolerance.
    pub fn converged(&self) -> bool {
        self.converged
    }

    fn estimate(&mut self, w: &[f64]) -> Result<()> {
        let spec = self.spec;
        let s = spec.s;
        let w_mean = mean(w);

        let mut initial = Vec::with_capacity(spec.num_params());
        let mut bounds = Vec::with_capacity(spec.num_params());
        if spec.include_mean() {
            initial.push(w_mean);
            bounds.push((f64::NEG_INFINITY, f64::INFINITY));
        }
        for order in [spec.p, spec.q, spec.cap_p, spec.cap_q] {
            for i in 0..order {
                initial.push(0.1 / (i + 1) as f64);
                bounds.push((-COEFFICIENT_BOUND, COEFFICIENT_BOUND));
            }
        }

        if initial.is_empty() {
            self.coefficients = Coefficients::default();
            self.converged = true;
            return Ok(());
        }

        // Normalising by the total sum of squares keeps the tolerance scale-free.
        let total_ss = w.iter().map(|x| (x - w_mean).powi(2)).sum::<f64>().max(1e-12);
        let start = spec.ar_order();
        let objective = |params: &[f64]| {
            let c = Coefficients::from_params(&spec, params);
            let (ar, ma) = c.expanded(s);
            let e = innovations(w, c.mean, &ar, &ma);
            let css: f64 = e[start..].iter().map(|x| x * x).sum();
            if css.is_finite() {
                css / total_ss
            } else {
                f64::INFINITY
            }
        };

        let config = NelderMeadConfig {
            max_iter: 500 * initial.len(),
            tolerance: 1e-10,
            point_tolerance: 1e-6,
            ..Default::default()
        };
        let result = nelder_mead(objective, &initial, Some(&bounds), config);
        debug!(
            "{} css optimisation: {} iterations, {} evaluations, value {:.6e}",
            spec, result.iterations, result.evaluations, result.optimal_value
        );

        if !result.optimal_value.is_finite() {
            return Err(ForecastError::ComputationError(format!(
                "{spec} estimation produced a non-finite objective"
            )));
        }
        if !result.converged {
            warn!("{spec} optimiser stopped at max_iter without converging");
        }

        self.coefficients = Coefficients::from_params(&spec, &result.optimal_point);
        self.converged = result.converged;
        Ok(())
    }

    fn compute_diagnostics(&mut self, values: &[f64], w: &[f64]) -> Result<()> {
        let spec = self.spec;
        let (ar, ma) = self.coefficients.expanded(spec.s);
        let residuals = innovations(w, self.coefficients.mean, &ar, &ma);
        let start = ar.len();
        let loss = spec.differencing_order();

        let effective = &residuals[start..];
        let n_eff = effective.len() as f64;
        let variance = effective.iter().map(|r| r * r).sum::<f64>() / n_eff;
        if !variance.is_finite() {
            return Err(ForecastError::ComputationError(format!(
                "{spec} residual variance is not finite"
            )));
        }

        let k = spec.num_params() as f64 + 1.0;
        let ll = -0.5 * n_eff * (1.0 + variance.max(1e-300).ln() + (2.0 * std::f64::consts::PI).ln());
        self.aic = Some(-2.0 * ll + 2.0 * k);
        self.bic = Some(-2.0 * ll + k * n_eff.ln());
        self.residual_variance = Some(variance);

        // Differencing is linear, so the one-step error is the same on both scales.
        let mut fitted = vec![f64::NAN; values.len()];
        for (j, e) in residuals.iter().enumerate().skip(start) {
            fitted[j + loss] = values[j + loss] - e;
        }

        self.fitted = Some(fitted);
        self.residuals = Some(residuals);
        Ok(())
    }

    /// MA(inf) weights of the integrated model, `psi[0] = 1`.
    fn psi_weights(&self, horizon: usize) -> Vec<f64> {
        let spec = self.spec;
        let full_ar = multiply_polynomials(
            &self.coefficients.ar_polynomial(spec.s),
            &differencing_polynomial(spec.d, spec.cap_d, spec.s),
        );
        let ma = self.coefficients.ma_polynomial(spec.s);

        let mut psi = Vec::with_capacity(horizon);
        for j in 0..horizon {
            if j == 0 {
                psi.push(1.0);
                continue;
            }
            let mut value = ma.get(j).copied().unwrap_or(0.0);
            for k in 1..=j.min(full_ar.len() - 1) {
                value -= full_ar[k] * psi[j - k];
            }
            psi.push(value);
        }
        psi
    }
}

impl Default for SARIMA {
    fn default() -> Self {
        Self::from_spec(SARIMASpec::default())
    }
}

impl Forecaster for SARIMA {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        self.spec.validate()?;
        let values = series.primary_values();
        if series.has_missing_values() {
            return Err(ForecastError::InvalidParameter(
                "series contains NaN or infinite values".to_string(),
            ));
        }

        let needed = self.spec.min_observations();
        if values.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: values.len(),
            });
        }

        let w = seasonal_difference(
            &difference(values, self.spec.d),
            self.spec.cap_d,
            self.spec.s,
        );

        self.estimate(&w)?;
        self.compute_diagnostics(values, &w)?;
        self.original = Some(values.to_vec());
        self.differenced = Some(w);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let original = self.original.as_ref().ok_or(ForecastError::FitRequired)?;
        let w = self.differenced.as_ref().ok_or(ForecastError::FitRequired)?;
        let residuals = self.residuals.as_ref().ok_or(ForecastError::FitRequired)?;

        if horizon == 0 {
            return Ok(Forecast::new());
        }

        let spec = self.spec;
        let (ar, ma) = self.coefficients.expanded(spec.s);
        let mu = self.coefficients.mean;

        let mut extended = w.clone();
        let mut errors = residuals.clone();
        for _ in 0..horizon {
            let t = extended.len();
            let mut pred = mu;
            for (k, a) in ar.iter().enumerate().take(t) {
                pred += a * (extended[t - 1 - k] - mu);
            }
            for (k, m) in ma.iter().enumerate().take(t) {
                pred += m * errors[t - 1 - k];
            }
            extended.push(pred);
            // future innovations have zero expectation
            errors.push(0.0);
        }

        let poly = differencing_polynomial(spec.d, spec.cap_d, spec.s);
        let predictions = integrate(&extended[w.len()..], original, &poly);
        if predictions.iter().any(|p| !p.is_finite()) {
            return Err(ForecastError::ComputationError(format!(
                "{spec} produced non-finite forecasts"
            )));
        }

        Ok(Forecast::from_values(predictions))
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        if !(level > 0.0 && level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "confidence level must be in (0, 1), got {level}"
            )));
        }
        let forecast = self.predict(horizon)?;
        if horizon == 0 {
            return Ok(forecast);
        }

        let sigma2 = self.residual_variance.unwrap_or(0.0);
        let z = quantile_normal((1.0 + level) / 2.0);
        let psi = self.psi_weights(horizon);

        let mut cumulative = 0.0;
        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        for (pred, weight) in forecast.primary().iter().zip(psi) {
            cumulative += weight * weight;
            let se = (sigma2 * cumulative).sqrt();
            lower.push(pred - z * se);
            upper.push(pred + z * se);
        }

        Ok(Forecast::from_values_with_intervals(
            forecast.into_values(),
            lower,
            upper,
        ))
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        "SARIMA"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone, Utc};

    fn make_ts(values: Vec<f64>) -> TimeSeries {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let timestamps = (0..values.len())
            .map(|i| base + Duration::days(i as i64))
            .collect();
        TimeSeries::univariate(timestamps, values).unwrap()
    }

    fn seasonal_sales(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let t = i as f64;
                500.0
                    + 1.5 * t
                    + 40.0 * (2.0 * std::f64::consts::PI * t / 12.0).sin()
                    + 7.0 * (t * 1.7).sin()
            })
            .collect()
    }

    #[test]
    fn spec_orders() {
        let spec = SARIMASpec::default();
        assert_eq!(spec.ar_order(), 13);
        assert_eq!(spec.ma_order(), 13);
        assert_eq!(spec.differencing_order(), 13);
        assert_eq!(spec.num_params(), 4);
        assert!(!spec.include_mean());
        assert!(spec.is_seasonal());
        assert_eq!(spec.to_string(), "SARIMA(1,1,1)(1,1,1)[12]");
        assert_eq!(SARIMASpec::non_seasonal(2, 0, 1).to_string(), "SARIMA(2,0,1)");
        assert_eq!(SARIMASpec::non_seasonal(2, 0, 1).num_params(), 4);
    }

    #[test]
    fn expanded_polynomials_are_multiplicative() {
        let c = Coefficients {
            mean: 0.0,
            ar: vec![0.5],
            ma: vec![0.3],
            seasonal_ar: vec![0.4],
            seasonal_ma: vec![0.2],
        };
        let (ar, ma) = c.expanded(4);
        // (1 - 0.5B)(1 - 0.4B^4) = 1 - 0.5B - 0.4B^4 + 0.2B^5
        assert_eq!(ar.len(), 5);
        assert_relative_eq!(ar[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(ar[3], 0.4, epsilon = 1e-12);
        assert_relative_eq!(ar[4], -0.2, epsilon = 1e-12);
        // (1 + 0.3B)(1 + 0.2B^4) = 1 + 0.3B + 0.2B^4 + 0.06B^5
        assert_relative_eq!(ma[0], 0.3, epsilon = 1e-12);
        assert_relative_eq!(ma[3], 0.2, epsilon = 1e-12);
        assert_relative_eq!(ma[4], 0.06, epsilon = 1e-12);
    }

    #[test]
    fn sarima_forecast_length_matches_horizon() {
        let ts = make_ts(seasonal_sales(80));
        let mut model = SARIMA::default();
        model.fit(&ts).unwrap();

        let forecast = model.predict(20).unwrap();
        assert_eq!(forecast.horizon(), 20);
        assert!(forecast.primary().iter().all(|v| v.is_finite()));
        assert_eq!(model.ar_coefficients().len(), 1);
        assert_eq!(model.seasonal_ma_coefficients().len(), 1);
        assert!(model.aic().is_some());
        assert!(model.bic().is_some());
    }

    #[test]
    fn trend_plus_fixed_season_is_continued_exactly() {
        // (1-B)(1-B^12) annihilates a linear trend plus a period-12 pattern
        let pattern = [3.0, 8.0, 1.0, 9.0, 4.0, 6.0, 2.0, 7.0, 5.0, 0.0, 10.0, 11.0];
        let series: Vec<f64> = (0..72)
            .map(|i| 100.0 + 2.0 * i as f64 + pattern[i % 12])
            .collect();
        let ts = make_ts(series[..60].to_vec());

        let mut model = SARIMA::default();
        model.fit(&ts).unwrap();
        let forecast = model.predict(12).unwrap();

        for (pred, actual) in forecast.primary().iter().zip(&series[60..]) {
            assert_relative_eq!(pred, actual, epsilon = 1e-6);
        }
    }

    #[test]
    fn fitted_values_are_on_original_scale() {
        let values = seasonal_sales(80);
        let ts = make_ts(values.clone());
        let mut model = SARIMA::default();
        model.fit(&ts).unwrap();

        let fitted = model.fitted_values().unwrap();
        assert_eq!(fitted.len(), 80);
        assert!(fitted[..26].iter().all(|v| v.is_nan()));
        for (f, v) in fitted[26..].iter().zip(&values[26..]) {
            assert!((f - v).abs() < 100.0);
        }
        assert_eq!(model.residuals().unwrap().len(), 80 - 13);
    }

    #[test]
    fn ar1_coefficient_is_recovered() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(42);
        let mut values = vec![0.0];
        for i in 1..300 {
            let shock: f64 = rng.gen_range(-1.0..1.0);
            values.push(0.7 * values[i - 1] + shock);
        }
        let ts = make_ts(values);
        let mut model = SARIMA::from_spec(SARIMASpec::non_seasonal(1, 0, 0));
        model.fit(&ts).unwrap();

        assert!((model.ar_coefficients()[0] - 0.7).abs() < 0.15);
    }

    #[test]
    fn intervals_widen_with_horizon() {
        let ts = make_ts(seasonal_sales(80));
        let mut model = SARIMA::default();
        model.fit(&ts).unwrap();

        let forecast = model.predict_with_intervals(10, 0.95).unwrap();
        let lower = forecast.lower().unwrap();
        let upper = forecast.upper().unwrap();
        let widths: Vec<f64> = upper.iter().zip(lower).map(|(u, l)| u - l).collect();
        assert!(widths.iter().all(|w| *w >= 0.0));
        assert!(widths[9] >= widths[0]);
        assert!(model.predict_with_intervals(3, 1.5).is_err());
    }

    #[test]
    fn sarima_insufficient_data() {
        let ts = make_ts(seasonal_sales(20));
        let mut model = SARIMA::default();
        assert!(matches!(
            model.fit(&ts),
            Err(ForecastError::InsufficientData { needed: 31, got: 20 })
        ));
    }

    #[test]
    fn seasonal_terms_need_a_period() {
        let ts = make_ts(seasonal_sales(60));
        let mut model = SARIMA::new(1, 0, 0, 1, 0, 0, 0);
        assert!(matches!(
            model.fit(&ts),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn sarima_requires_fit() {
        let model = SARIMA::default();
        assert!(matches!(model.predict(5), Err(ForecastError::FitRequired)));
        assert!(!model.is_fitted());
    }

    #[test]
    fn sarima_zero_horizon() {
        let ts = make_ts(seasonal_sales(60));
        let mut model = SARIMA::default();
        model.fit(&ts).unwrap();
        assert_eq!(model.predict(0).unwrap().horizon(), 0);
        assert_eq!(model.name(), "SARIMA");
        assert!(model.is_fitted());
    }
}

//! Seasonal ARIMA forecasting.
//!
//! SARIMA(p,d,q)(P,D,Q)\[s\] combines regular and seasonal differencing with
//! multiplicative AR and MA polynomials:
//!
//! `phi(B) Phi(B^s) (1-B)^d (1-B^s)^D y_t = theta(B) Theta(B^s) e_t`
//!
//! # Example
//!
//! ```
//! use salescast::core::TimeSeries;
//! use salescast::models::sarima::{SARIMA, SARIMASpec};
//! use salescast::models::Forecaster;
//! use chrono::{Duration, TimeZone, Utc};
//!
//! let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let timestamps: Vec<_> = (0..60).map(|i| base + Duration::days(i)).collect();
//! let values: Vec<f64> = (0..60)
//!     .map(|i| 100.0 + i as f64 + 10.0 * ((i % 12) as f64 / 2.0).sin())
//!     .collect();
//! let ts = TimeSeries::univariate(timestamps, values).unwrap();
//!
//! let mut model = SARIMA::from_spec(SARIMASpec::default());
//! model.fit(&ts).unwrap();
//! let forecast = model.predict(12).unwrap();
//! assert_eq!(forecast.horizon(), 12);
//! ```

pub mod diff;
mod model;

pub use model::{SARIMASpec, SARIMA};

//! Serial-correlation features for diagnostics.
//!
//! # Example
//!
//! ```
//! use salescast::features::{acf, Correlogram};
//!
//! let series = vec![1.0, 3.0, 2.0, 5.0, 4.0, 6.0, 5.0, 8.0];
//! let r = acf(&series, 3).unwrap();
//! assert_eq!(r.len(), 4);
//!
//! let bands = Correlogram::acf(&series, 3, 0.95).unwrap();
//! assert_eq!(bands.max_lag(), 3);
//! ```

pub mod autocorrelation;

pub use autocorrelation::{acf, max_acf_lags, max_pacf_lags, pacf, Correlogram};

//! Statistical validation tests for fitted models.
//!
//! # Example
//!
//! ```
//! use salescast::validation::ljung_box;
//!
//! // Check if residuals are white noise
//! let residuals = vec![0.1, -0.2, 0.15, -0.1, 0.05, -0.08, 0.12, -0.15, 0.1, -0.05];
//! let lb_result = ljung_box(&residuals, Some(5), 0);
//! if lb_result.is_white_noise(0.05) {
//!     println!("Residuals pass Ljung-Box test");
//! }
//! ```


pub use residual_tests::{ljung_box, LjungBoxResult};

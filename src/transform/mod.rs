//! Data transformations feeding the sequence model.
//!
//! # Example
//!
//! ```
//! use salescast::transform::{MinMaxScaler, WindowDataset};
//!
//! let series = vec![10.0, 12.0, 14.0, 13.0, 15.0, 18.0];
//! let scaler = MinMaxScaler::fit(&series).unwrap();
//! let scaled = scaler.transform(&series);
//!
//! let windows = WindowDataset::build(&scaled, 3).unwrap();
//! assert_eq!(windows.len(), 3);
//! ```

pub mod scale;
pub mod window;

pub use scale::MinMaxScaler;
pub use window::WindowDataset;

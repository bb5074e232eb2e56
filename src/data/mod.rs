//! Input loading and chronological partitioning.

pub mod loader;
pub mod split;

pub use loader::{load_daily_totals, read_daily_totals, LoaderConfig};
pub use split::{split_index, train_test_split, TrainTestSplit};

//! Outlier-robust statistics over repeated samples.
//!
//! Latencies and q-errors are noisy; everything downstream works on
//! IQR-trimmed means and compares sample sets with a Welch t-test.

mod error;
mod metrics;
mod ttest;

pub use error::{TTestError, TTestResult};
pub use metrics::Metrics;
pub use ttest::{welch_t_test, TTest};

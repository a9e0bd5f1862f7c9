//! Cardinality estimation probes.
//!
//! Runs `EXPLAIN ANALYZE` over simple single-column predicates and records
//! the q-error of the estimate, bucketed by how common the probed value is.

mod error;
mod probe;
mod report;

pub use error::{CardError, CardResult};
pub use probe::{parse_columns, Bucket, CardConfig, Cardinalitor, ProbeMode, DEFAULT_CONCURRENCY};
pub use report::CardinalityReport;

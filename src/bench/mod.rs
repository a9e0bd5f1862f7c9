//! Plan-space benchmarking.
//!
//! [`Horoscope`] forces every plan the optimizer can produce for a query,
//! times them against the optimizer's default choice and verifies that
//! all of them return the same result. [`run_session`] drives a whole
//! workload and [`BenchReport`] summarizes it.

mod config;
mod engine;
mod error;
mod plan;
mod report;
mod session;
mod suboptimal;

#[cfg(test)]
mod fake;

pub use config::{BenchConfig, BenchOptions};
pub use engine::{Differential, Horoscope, PlanSpace};
pub use error::{BenchError, BenchResult, VerificationFailure};
pub use plan::{BenchmarkRun, PlanCandidate, PlanFingerprint};
pub use report::{BenchReport, BenchRow, FailureRow, QErrorSummary};
pub use session::{run_session, BenchCollection};
pub use suboptimal::{is_sub_optimal, ALPHA, SPEEDUP_THRESHOLD};

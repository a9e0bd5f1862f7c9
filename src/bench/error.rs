//! Benchmark errors.

use std::fmt;

use thiserror::Error;

use super::plan::BenchmarkRun;
use crate::executor::{ExecuteError, QueryOutcome};
use crate::sql::ParseError;

/// Result type for benchmarking.
pub type BenchResult<T> = Result<T, BenchError>;

/// Errors raised while benchmarking one query.
#[derive(Debug, Error)]
pub enum BenchError {
    /// The engine failed a statement for a plan of the query.
    #[error("query {query_id}, plan #{plan}: {source}")]
    Execute {
        query_id: String,
        plan: usize,
        #[source]
        source: ExecuteError,
    },

    /// A differential target failed the default plan's statement.
    #[error("query {query_id}, target {target}: {source}")]
    Target {
        query_id: String,
        target: String,
        #[source]
        source: ExecuteError,
    },

    /// The query text cannot carry a plan hint.
    #[error("query {query_id}: {source}")]
    Parse {
        query_id: String,
        #[source]
        source: ParseError,
    },

    /// Two executions of the same query disagreed.
    #[error(transparent)]
    Verification(Box<VerificationFailure>),
}

impl BenchError {
    pub fn execute(query_id: &str, plan: usize, source: ExecuteError) -> Self {
        BenchError::Execute {
            query_id: query_id.to_string(),
            plan,
            source,
        }
    }

    /// Whether retrying the query after a cool-down may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            BenchError::Execute { source, .. } | BenchError::Target { source, .. } => {
                source.is_transient()
            }
            _ => false,
        }
    }

    /// Whether the engine under test, or a differential target, rejected a
    /// statement.
    pub fn is_server(&self) -> bool {
        match self {
            BenchError::Execute { source, .. } | BenchError::Target { source, .. } => {
                source.is_server()
            }
            _ => false,
        }
    }

    pub fn verification(&self) -> Option<&VerificationFailure> {
        match self {
            BenchError::Verification(failure) => Some(failure.as_ref()),
            _ => None,
        }
    }

    pub fn query_id(&self) -> &str {
        match self {
            BenchError::Execute { query_id, .. }
            | BenchError::Target { query_id, .. }
            | BenchError::Parse { query_id, .. } => query_id,
            BenchError::Verification(failure) => &failure.run.query_id,
        }
    }
}

/// Diverging results, with everything needed to reproduce them.
#[derive(Debug, Clone)]
pub struct VerificationFailure {
    /// The run up to the failure, with `verification_failed` set.
    pub run: BenchmarkRun,
    /// Plan index whose result diverged.
    pub plan: usize,
    /// Differential target that produced `actual`, if any.
    pub target: Option<String>,
    pub sql: String,
    pub expected: QueryOutcome,
    pub actual: QueryOutcome,
}

impl fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Some(target) => write!(
                f,
                "query {}: results of primary and {} differ: expected {}, got {}",
                self.run.query_id, target, self.expected, self.actual
            ),
            None => write!(
                f,
                "query {}: results of plan #{} differ from the default plan #{}: expected {}, got {}",
                self.run.query_id, self.plan, self.run.default_plan.plan_index, self.expected, self.actual
            ),
        }
    }
}

impl std::error::Error for VerificationFailure {}

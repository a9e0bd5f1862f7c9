//! The boundary to the database under test.

use super::error::ExecuteResult;
use super::hints::Hints;
use super::result::{QueryOutcome, Rows};
use super::warning::Warning;
use crate::sql::QueryKind;

/// An `EXPLAIN` style answer and the diagnostics it raised.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Explained {
    pub rows: Rows,
    pub warnings: Vec<Warning>,
}

impl Explained {
    pub fn new(rows: Rows) -> Self {
        Self {
            rows,
            warnings: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: Warning) -> Self {
        self.warnings.push(warning);
        self
    }

    /// The out-of-range diagnostic, if the engine raised one.
    pub fn plan_out_of_range(&self) -> Option<&Warning> {
        self.warnings.iter().find(|w| w.is_plan_out_of_range())
    }
}

/// Oracle and stopwatch: everything the tester needs from an engine.
///
/// Implementations own their connection and isolation discipline. They must
/// be shareable across threads because the cardinality probe fans out.
pub trait Executor: Send + Sync {
    /// Run a read statement.
    fn query(&self, sql: &str) -> ExecuteResult<Rows>;

    /// Run a write statement and return the affected row count.
    fn exec(&self, sql: &str) -> ExecuteResult<u64>;

    /// Hints the optimizer would use to reproduce its plan for `sql`.
    fn get_hints(&self, sql: &str) -> ExecuteResult<Hints>;

    /// Structural plan description without running the statement.
    fn explain(&self, sql: &str) -> ExecuteResult<Explained>;

    /// Run the statement and report per-operator estimated and actual rows.
    fn explain_analyze(&self, sql: &str) -> ExecuteResult<Explained>;

    /// Run `sql` the way its kind demands.
    fn run(&self, sql: &str, kind: QueryKind) -> ExecuteResult<QueryOutcome> {
        match kind {
            QueryKind::Read => self.query(sql).map(QueryOutcome::Rows),
            QueryKind::Write => self.exec(sql).map(QueryOutcome::Affected),
        }
    }
}

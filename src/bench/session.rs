//! Benchmarking a whole workload.

use tracing::{debug, error, info, warn};

use super::config::BenchOptions;
use super::engine::Horoscope;
use super::error::{BenchError, BenchResult, VerificationFailure};
use super::plan::BenchmarkRun;
use crate::executor::Executor;
use crate::workload::QuerySource;

/// Everything a session produced.
#[derive(Debug, Default)]
pub struct BenchCollection {
    pub runs: Vec<BenchmarkRun>,
    /// Queries whose plans disagreed on the result.
    pub failures: Vec<VerificationFailure>,
    /// Queries dropped after a tolerated server error.
    pub skipped: Vec<String>,
}

impl BenchCollection {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Benchmark every query of the source.
///
/// Verification failures are recorded and the session moves on, as do
/// queries that cannot carry a plan hint. Server errors are tolerated only
/// with `ignore_server_errors`.
pub fn run_session<E, S>(horo: &mut Horoscope<E, S>, options: &BenchOptions) -> BenchResult<BenchCollection>
where
    E: Executor,
    S: QuerySource,
{
    let mut collection = BenchCollection::default();
    loop {
        match horo.next(options) {
            Ok(Some(run)) => {
                log_run(&run);
                collection.runs.push(run);
            }
            Ok(None) => break,
            Err(BenchError::Verification(failure)) => {
                error!(
                    query_id = %failure.run.query_id,
                    plan = failure.plan,
                    target = failure.target.as_deref().unwrap_or("primary"),
                    query = %failure.sql,
                    expected = %failure.expected,
                    actual = %failure.actual,
                    "query results verification fails"
                );
                collection.failures.push(*failure);
            }
            Err(e @ BenchError::Parse { .. }) => {
                warn!(query_id = e.query_id(), error = %e, "cannot force plans on the query, skipping");
                collection.skipped.push(e.query_id().to_string());
            }
            Err(e) if options.ignore_server_errors && e.is_server() => {
                warn!(query_id = e.query_id(), error = %e, "occurs an error when benching the query");
                collection.skipped.push(e.query_id().to_string());
            }
            Err(e) => return Err(e),
        }
    }
    info!(
        queries = collection.runs.len(),
        failures = collection.failures.len(),
        skipped = collection.skipped.len(),
        "benchmark session finished"
    );
    Ok(collection)
}

fn log_run(run: &BenchmarkRun) {
    let default = &run.default_plan;
    info!(
        query_id = %run.query_id,
        query = %default.sql,
        default_plan = default.plan_index,
        default_hints = %default.hints,
        cost = ?default.timing.as_ref().map(|m| m.values()),
        plan_space = run.plan_space,
        "complete a step"
    );
    for plan in run.better_plans() {
        let (Some(better), Some(base)) = (&plan.timing, &default.timing) else {
            continue;
        };
        warn!(
            query_id = %run.query_id,
            better_plan = plan.plan_index,
            better_hints = %plan.hints,
            "may choose a suboptimal plan ({:.2}ms < {:.2}ms)",
            better.mean(),
            base.mean()
        );
        debug!(query_id = %run.query_id, better_sql = %plan.sql, "better plan");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::bench::fake::FakeEngine;
    use crate::bench::{BenchConfig, Differential};
    use crate::executor::{QueryOutcome, Rows};
    use crate::sql::Query;
    use crate::workload::QueryList;

    fn session(fake: FakeEngine) -> Horoscope<FakeEngine, QueryList> {
        let queries = QueryList::new([
            Query::new("q1", "SELECT a FROM t").unwrap(),
            Query::new("q2", "SELECT a FROM t WHERE b = 1").unwrap(),
        ]);
        let config = BenchConfig::default()
            .collect_cardinality(false)
            .retry_cooldown(Duration::ZERO);
        Horoscope::new(fake, queries).with_config(config)
    }

    #[test]
    fn test_collects_every_query() {
        let mut horo = session(FakeEngine::new(vec!["IndexReader_1", "TableReader_2"]));
        let collection = run_session(&mut horo, &BenchOptions::default().round(2)).unwrap();
        let ids: Vec<&str> = collection.runs.iter().map(|r| r.query_id.as_str()).collect();
        assert_eq!(ids, ["q1", "q2"]);
        assert!(!collection.has_failures());
        assert_eq!(collection.runs[0].default_plan.timing.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn test_verification_failures_do_not_stop_session() {
        let diverging = QueryOutcome::Rows(Rows::from_strings(["a"], vec![vec!["7"]]));
        let fake = FakeEngine::new(vec!["IndexReader_1", "TableReader_2"]).with_result(1, diverging);
        let mut horo = session(fake);
        let collection = run_session(&mut horo, &BenchOptions::default()).unwrap();
        assert!(collection.runs.is_empty());
        assert_eq!(collection.failures.len(), 2);
        assert_eq!(collection.failures[1].run.query_id, "q2");
    }

    #[test]
    fn test_server_errors_tolerated_only_when_ignored() {
        let fake = FakeEngine::new(vec!["IndexReader_1", "TableReader_2"]).failing(0);
        let mut horo = session(fake);
        let options = BenchOptions::default().ignore_server_errors(true);
        let collection = run_session(&mut horo, &options).unwrap();
        assert_eq!(collection.skipped, ["q1", "q2"]);

        let fake = FakeEngine::new(vec!["IndexReader_1", "TableReader_2"]).failing(0);
        let mut horo = session(fake);
        let err = run_session(&mut horo, &BenchOptions::default()).unwrap_err();
        assert_eq!(err.query_id(), "q1");
    }

    #[test]
    fn test_query_without_hint_position_is_skipped() {
        let queries = QueryList::new([
            Query::new("q1", "SELECT a FROM t").unwrap(),
            Query::new("cte", "WITH x AS (SELECT a FROM t) SELECT * FROM x").unwrap(),
            Query::new("q3", "SELECT a FROM t WHERE b = 3").unwrap(),
        ]);
        let config = BenchConfig::default()
            .collect_cardinality(false)
            .retry_cooldown(Duration::ZERO);
        let fake = FakeEngine::new(vec!["IndexReader_1", "TableReader_2"]);
        let mut horo = Horoscope::new(fake, queries).with_config(config);

        let collection = run_session(&mut horo, &BenchOptions::default()).unwrap();
        let ids: Vec<&str> = collection.runs.iter().map(|r| r.query_id.as_str()).collect();
        assert_eq!(ids, ["q1", "q3"]);
        assert_eq!(collection.skipped, ["cte"]);
        assert!(!collection.has_failures());
    }

    #[test]
    fn test_differential_server_errors_follow_ignore_flag() {
        let broken = || Differential::new("mysql-8.0", FakeEngine::new(vec!["TableReader_1"]).failing(0));

        let mut horo = session(FakeEngine::new(vec!["IndexReader_1", "TableReader_2"])).with_differential([broken()]);
        let options = BenchOptions::default().ignore_server_errors(true);
        let collection = run_session(&mut horo, &options).unwrap();
        assert!(collection.runs.is_empty());
        assert_eq!(collection.skipped, ["q1", "q2"]);

        let mut horo = session(FakeEngine::new(vec!["IndexReader_1", "TableReader_2"])).with_differential([broken()]);
        let err = run_session(&mut horo, &BenchOptions::default()).unwrap_err();
        assert!(matches!(err, BenchError::Target { ref target, .. } if target == "mysql-8.0"));
        assert_eq!(err.query_id(), "q1");
    }
}

//! The plan-space benchmark engine.
//!
//! For each query the engine asks the optimizer for every plan it can
//! produce (`NTH_PLAN(1)`, `NTH_PLAN(2)`, ... until the engine reports the
//! index as out of range), identifies which of them is the optimizer's own
//! choice, times all of them and checks that they agree on the result.

use std::thread;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::config::{BenchConfig, BenchOptions};
use super::error::{BenchError, BenchResult, VerificationFailure};
use super::plan::{BenchmarkRun, PlanCandidate, PlanFingerprint};
use crate::executor::{ExecuteError, ExecuteResult, Executor, QueryOutcome, ERR_UNKNOWN};
use crate::explain::ExplainAnalyzeTree;
use crate::metrics::Metrics;
use crate::sql::{with_plan_hint, ParseError, Query};
use crate::workload::QuerySource;

/// A secondary engine whose answers must match the primary's.
pub struct Differential {
    pub name: String,
    pub executor: Box<dyn Executor>,
}

impl Differential {
    pub fn new(name: impl Into<String>, executor: impl Executor + 'static) -> Self {
        Self {
            name: name.into(),
            executor: Box::new(executor),
        }
    }
}

/// Every plan the optimizer offers for one query.
#[derive(Debug, Clone)]
pub struct PlanSpace {
    /// The hint-free statement, `plan_index == 0`.
    pub baseline: PlanCandidate,
    /// Forced plans, contiguous from index 1.
    pub candidates: Vec<PlanCandidate>,
}

impl PlanSpace {
    /// Position in `candidates` of the first plan identical to the baseline.
    pub fn default_position(&self) -> Option<usize> {
        self.candidates
            .iter()
            .position(|c| c.fingerprint == self.baseline.fingerprint)
    }
}

/// Latency samples of one plan and the outcome it produced.
struct Timing {
    metrics: Metrics,
    /// First outcome, or the one that diverged from the oracle.
    outcome: QueryOutcome,
    diverged: bool,
}

/// Benchmarks queries pulled from a [`QuerySource`] on one [`Executor`].
pub struct Horoscope<E, S> {
    executor: E,
    source: S,
    config: BenchConfig,
    differential: Vec<Differential>,
}

impl<E: Executor, S: QuerySource> Horoscope<E, S> {
    pub fn new(executor: E, source: S) -> Self {
        Self {
            executor,
            source,
            config: BenchConfig::default(),
            differential: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: BenchConfig) -> Self {
        self.config = config;
        self
    }

    /// Compare the default plan's result against other engines.
    pub fn with_differential(mut self, targets: impl IntoIterator<Item = Differential>) -> Self {
        self.differential.extend(targets);
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Benchmark the next query; `Ok(None)` once the source is exhausted.
    ///
    /// Connection failures put the engine to sleep for the configured
    /// cool-down and restart the same query from scratch.
    pub fn next(&mut self, options: &BenchOptions) -> BenchResult<Option<BenchmarkRun>> {
        let Some(query) = self.source.next_query() else {
            return Ok(None);
        };

        let mut attempt = 0usize;
        loop {
            match self.bench(&query, options) {
                Err(e) if e.is_transient() && self.config.max_retries.map_or(true, |max| attempt < max) => {
                    attempt += 1;
                    warn!(
                        query_id = query.id(),
                        attempt,
                        cooldown = ?self.config.retry_cooldown,
                        error = %e,
                        "connection failure, retrying the query"
                    );
                    thread::sleep(self.config.retry_cooldown);
                }
                result => return result.map(Some),
            }
        }
    }

    /// Benchmark one query once.
    pub fn bench(&self, query: &Query, options: &BenchOptions) -> BenchResult<BenchmarkRun> {
        let id = query.id();
        let space = self.enumerate(query, options.max_plans)?;
        let default_at = space.default_position();
        let PlanSpace {
            baseline,
            mut candidates,
        } = space;
        let plan_space = candidates.len();

        let mut default_plan = baseline;
        if let Some(at) = default_at {
            default_plan.plan_index = candidates.remove(at).plan_index;
        }
        info!(
            query_id = id,
            default_plan = default_plan.plan_index,
            plan_space,
            default_hints = %default_plan.hints,
            "enumerated plan space"
        );

        let timing = self
            .time_plan(query, &default_plan.sql, options.round, None)
            .map_err(|e| BenchError::execute(id, default_plan.plan_index, e))?;
        let oracle = timing.outcome;
        info!(query_id = id, cost = %timing.metrics, "complete default plan");
        default_plan.timing = Some(timing.metrics);

        let mut run = BenchmarkRun {
            query_id: id.to_string(),
            query_kind: query.kind(),
            round: options.round,
            plan_space,
            default_plan,
            alternate_plans: Vec::with_capacity(candidates.len()),
            verification_failed: false,
        };

        for mut plan in candidates {
            let expected = options.verify.then_some(&oracle);
            match self.time_plan(query, &plan.sql, options.round, expected) {
                Ok(timing) if timing.diverged => {
                    let (index, sql) = (plan.plan_index, plan.sql.clone());
                    plan.timing = Some(timing.metrics);
                    run.alternate_plans.push(plan);
                    run.verification_failed = true;
                    return Err(BenchError::Verification(Box::new(VerificationFailure {
                        run,
                        plan: index,
                        target: None,
                        sql,
                        expected: oracle,
                        actual: timing.outcome,
                    })));
                }
                Ok(timing) => {
                    info!(query_id = id, plan = plan.plan_index, cost = %timing.metrics, "complete execution plan");
                    plan.timing = Some(timing.metrics);
                }
                Err(e) if options.ignore_server_errors && e.is_server() => {
                    warn!(query_id = id, plan = plan.plan_index, error = %e, "server error, skipping plan");
                }
                Err(e) => return Err(BenchError::execute(id, plan.plan_index, e)),
            }
            run.alternate_plans.push(plan);
        }

        if self.config.collect_cardinality {
            self.attach_explain_analyze(id, &mut run.default_plan)?;
            for plan in run.alternate_plans.iter_mut().filter(|p| p.timing.is_some()) {
                self.attach_explain_analyze(id, plan)?;
            }
        }

        for target in &self.differential {
            let actual = target
                .executor
                .run(&run.default_plan.sql, query.kind())
                .map_err(|source| BenchError::Target {
                    query_id: id.to_string(),
                    target: target.name.clone(),
                    source,
                })?
                .normalized(query.order_by());
            if actual != oracle {
                run.verification_failed = true;
                let (plan, sql) = (run.default_plan.plan_index, run.default_plan.sql.clone());
                return Err(BenchError::Verification(Box::new(VerificationFailure {
                    run,
                    plan,
                    target: Some(target.name.clone()),
                    sql,
                    expected: oracle,
                    actual,
                })));
            }
            debug!(query_id = id, target = %target.name, "differential target agrees");
        }

        Ok(run)
    }

    /// Describe the baseline and every forced plan up to `max_plans`.
    ///
    /// Stops at the first index the engine reports as out of range; any
    /// other engine error aborts the enumeration.
    pub fn enumerate(&self, query: &Query, max_plans: usize) -> BenchResult<PlanSpace> {
        let id = query.id();
        let parse_error = |source: ParseError| BenchError::Parse {
            query_id: id.to_string(),
            source,
        };

        let baseline_sql = with_plan_hint(query.sql(), 0).map_err(parse_error)?;
        let baseline = self.describe(id, 0, baseline_sql)?.ok_or_else(|| {
            let source = ExecuteError::server(ERR_UNKNOWN, "nth_plan diagnostic without a forced plan");
            BenchError::execute(id, 0, source)
        })?;

        let mut candidates = Vec::new();
        for index in 1..=max_plans {
            let sql = with_plan_hint(query.sql(), index).map_err(parse_error)?;
            match self.describe(id, index, sql)? {
                Some(candidate) => {
                    debug!(query_id = id, plan = index, hints = %candidate.hints, "found plan");
                    candidates.push(candidate);
                }
                None => {
                    debug!(query_id = id, plan = index, "plan index out of range, enumeration complete");
                    break;
                }
            }
        }
        Ok(PlanSpace {
            baseline,
            candidates,
        })
    }

    /// `EXPLAIN` and hints for one plan; `None` when the index is out of range.
    fn describe(&self, query_id: &str, index: usize, sql: String) -> BenchResult<Option<PlanCandidate>> {
        let explained = match self.executor.explain(&sql) {
            Err(e) if e.is_plan_out_of_range() => return Ok(None),
            other => other.map_err(|e| BenchError::execute(query_id, index, e))?,
        };
        if let Some(warning) = explained.plan_out_of_range() {
            debug!(query_id, plan = index, %warning, "engine rejected plan index");
            return Ok(None);
        }

        let hints = match self.executor.get_hints(&sql) {
            Err(e) if e.is_plan_out_of_range() => return Ok(None),
            other => other.map_err(|e| BenchError::execute(query_id, index, e))?,
        };
        let fingerprint = PlanFingerprint::from_rows(&explained.rows);
        Ok(Some(PlanCandidate::new(index, sql, hints.without_plan_hint(), fingerprint)))
    }

    /// Run `sql` `round` times, stopping at the first result that differs
    /// from `oracle`.
    fn time_plan(
        &self,
        query: &Query,
        sql: &str,
        round: usize,
        oracle: Option<&QueryOutcome>,
    ) -> ExecuteResult<Timing> {
        let mut samples = Vec::with_capacity(round.max(1));
        let mut first = None;
        for _ in 0..round.max(1) {
            let start = Instant::now();
            let outcome = self.executor.run(sql, query.kind())?;
            samples.push(start.elapsed().as_secs_f64() * 1000.0);

            let outcome = outcome.normalized(query.order_by());
            if oracle.is_some_and(|expected| *expected != outcome) {
                return Ok(Timing {
                    metrics: latency(samples),
                    outcome,
                    diverged: true,
                });
            }
            first.get_or_insert(outcome);
        }
        let outcome = first.ok_or_else(|| ExecuteError::MalformedOutput("no repetition ran".into()))?;
        Ok(Timing {
            metrics: latency(samples),
            outcome,
            diverged: false,
        })
    }

    /// Best effort: only connection failures propagate, to trigger a retry.
    fn attach_explain_analyze(&self, query_id: &str, plan: &mut PlanCandidate) -> BenchResult<()> {
        match self.executor.explain_analyze(&plan.sql) {
            Ok(explained) => {
                plan.explain_analyze = ExplainAnalyzeTree::parse(&explained.rows);
                if plan.explain_analyze.is_none() {
                    warn!(query_id, plan = plan.plan_index, "unexpected execution-analysis report");
                }
            }
            Err(e) if e.is_transient() => return Err(BenchError::execute(query_id, plan.plan_index, e)),
            Err(e) => {
                warn!(query_id, plan = plan.plan_index, error = %e, "cannot collect cardinality");
            }
        }
        Ok(())
    }
}

fn latency(samples: Vec<f64>) -> Metrics {
    Metrics::record(samples).with_unit("ms")
}

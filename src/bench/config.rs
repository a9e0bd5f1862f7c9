//! Benchmark configuration.

use std::time::Duration;

/// Engine-wide settings, fixed for a session.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Run `EXPLAIN ANALYZE` for every timed plan.
    pub collect_cardinality: bool,
    /// Pause before retrying a query after a connection failure.
    pub retry_cooldown: Duration,
    /// Retries per query; `None` retries until the engine comes back.
    pub max_retries: Option<usize>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            collect_cardinality: true,
            retry_cooldown: Duration::from_secs(120),
            max_retries: None,
        }
    }
}

impl BenchConfig {
    /// Set collect_cardinality flag.
    pub fn collect_cardinality(mut self, value: bool) -> Self {
        self.collect_cardinality = value;
        self
    }

    pub fn retry_cooldown(mut self, value: Duration) -> Self {
        self.retry_cooldown = value;
        self
    }

    pub fn max_retries(mut self, value: Option<usize>) -> Self {
        self.max_retries = value;
        self
    }
}

/// Per-query benchmark parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchOptions {
    /// Repetitions per plan; at least one is always run.
    pub round: usize,
    /// Upper bound on forced plans to enumerate.
    pub max_plans: usize,
    /// Compare every plan's result against the default plan's.
    pub verify: bool,
    /// Skip plans the engine fails instead of aborting the query.
    pub ignore_server_errors: bool,
}

impl Default for BenchOptions {
    fn default() -> Self {
        Self {
            round: 1,
            max_plans: 1000,
            verify: true,
            ignore_server_errors: false,
        }
    }
}

impl BenchOptions {
    pub fn round(mut self, value: usize) -> Self {
        self.round = value;
        self
    }

    pub fn max_plans(mut self, value: usize) -> Self {
        self.max_plans = value;
        self
    }

    pub fn verify(mut self, value: bool) -> Self {
        self.verify = value;
        self
    }

    pub fn ignore_server_errors(mut self, value: bool) -> Self {
        self.ignore_server_errors = value;
        self
    }
}

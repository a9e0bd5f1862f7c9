//! Estimation-error probes over single columns.

use std::collections::{BTreeMap, HashSet};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

use super::error::{CardError, CardResult};
use super::report::CardinalityReport;
use crate::executor::Executor;
use crate::explain::ExplainAnalyzeTree;
use crate::metrics::Metrics;

pub const DEFAULT_CONCURRENCY: usize = 30;

/// Which predicate shape to probe with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeMode {
    /// `col = v` for every distinct value.
    Emq,
    /// `lb <= col < ub` for every pair of distinct values.
    Rge,
}

/// Subset of a column's values a q-error sample belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Bucket {
    #[serde(rename = "all")]
    All,
    #[serde(rename = "most_common_10%")]
    MostCommon,
    #[serde(rename = "least_common_10%")]
    LeastCommon,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::All => "all",
            Bucket::MostCommon => "most_common_10%",
            Bucket::LeastCommon => "least_common_10%",
        }
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct CardConfig {
    /// Exact-match probes in flight at once.
    pub concurrency: usize,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl CardConfig {
    pub fn concurrency(mut self, value: usize) -> Self {
        self.concurrency = value;
        self
    }
}

/// Parse `t1.c1,t1.c2,t2.c1` into columns grouped by table, keeping order.
pub fn parse_columns(spec: &str) -> CardResult<BTreeMap<String, Vec<String>>> {
    let mut columns: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for pair in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (table, column) = pair
            .rsplit_once('.')
            .or_else(|| pair.split_once(':'))
            .filter(|(t, c)| !t.is_empty() && !c.is_empty())
            .ok_or_else(|| CardError::InvalidColumn(pair.to_string()))?;
        columns.entry(table.to_string()).or_default().push(column.to_string());
    }
    if columns.is_empty() {
        return Err(CardError::InvalidColumn(spec.to_string()));
    }
    Ok(columns)
}

/// Measures how far the engine's row estimates for single-column
/// predicates are from the actual counts.
pub struct Cardinalitor<E> {
    executor: E,
    config: CardConfig,
}

impl<E: Executor> Cardinalitor<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            config: CardConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CardConfig) -> Self {
        self.config = config;
        self
    }

    /// Probe every listed column and summarize per table and column.
    ///
    /// `timeout` bounds the whole run; only range probes observe it.
    pub fn run_all(
        &self,
        table_columns: &BTreeMap<String, Vec<String>>,
        mode: ProbeMode,
        timeout: Option<Duration>,
    ) -> CardResult<CardinalityReport> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut report = CardinalityReport::new(mode);
        for (table, columns) in table_columns {
            for column in columns {
                let buckets = match mode {
                    ProbeMode::Emq => self.probe_exact_match(table, column)?,
                    ProbeMode::Rge => BTreeMap::from([(Bucket::All, self.probe_range(table, column, deadline)?)]),
                };
                if let Some(all) = buckets.get(&Bucket::All) {
                    info!(
                        table = %table,
                        column = %column,
                        q_error_50th = all.quantile(0.5),
                        q_error_90th = all.quantile(0.9),
                        q_error_95th = all.quantile(0.95),
                        q_error_max = all.quantile(1.0),
                        "q-error for {}.{}",
                        table,
                        column
                    );
                }
                report.insert(table, column, buckets);
            }
        }
        Ok(report)
    }

    /// `col = v` for every distinct value, fanned out over worker threads.
    pub fn probe_exact_match(&self, table: &str, column: &str) -> CardResult<BTreeMap<Bucket, Metrics>> {
        let (t, c) = (quote_table(table), quote_ident(column));
        let p10 = self.distinct_count(table, column)? / 10;
        let most_common: HashSet<Option<String>> = self
            .values(table, column, &format!("SELECT {c} FROM {t} GROUP BY {c} ORDER BY COUNT(*) DESC LIMIT {p10}"))?
            .into_iter()
            .collect();
        let least_common: HashSet<Option<String>> = self
            .values(table, column, &format!("SELECT {c} FROM {t} GROUP BY {c} ORDER BY COUNT(*) LIMIT {p10}"))?
            .into_iter()
            .collect();
        let values = self.values(table, column, &format!("SELECT DISTINCT({c}) FROM {t}"))?;

        let samples: Mutex<BTreeMap<Bucket, Vec<f64>>> = Mutex::new(
            [Bucket::All, Bucket::MostCommon, Bucket::LeastCommon]
                .into_iter()
                .map(|b| (b, Vec::new()))
                .collect(),
        );
        let first_error: Mutex<Option<CardError>> = Mutex::new(None);
        let concurrency = self.config.concurrency.max(1);
        let (tx, rx) = mpsc::sync_channel::<Option<String>>(concurrency);
        // Only workers hold the receiver, so sends fail once they are all gone.
        let rx = Arc::new(Mutex::new(rx));
        let (samples_ref, errors) = (&samples, &first_error);
        let (most_common, least_common) = (&most_common, &least_common);

        let panicked = thread::scope(|s| {
            let workers: Vec<_> = (0..concurrency)
                .map(|_| {
                    let rx = Arc::clone(&rx);
                    s.spawn(move || loop {
                        let Ok(value) = rx.lock().recv() else {
                            break;
                        };
                        // Keep draining after a failure so the producer never blocks.
                        if errors.lock().is_some() {
                            continue;
                        }
                        match self.exact_match_q_error(table, column, value.as_deref()) {
                            Ok(Some(q_error)) => {
                                let mut samples = samples_ref.lock();
                                if let Some(all) = samples.get_mut(&Bucket::All) {
                                    all.push(q_error);
                                }
                                if most_common.contains(&value) {
                                    samples.entry(Bucket::MostCommon).or_default().push(q_error);
                                }
                                if least_common.contains(&value) {
                                    samples.entry(Bucket::LeastCommon).or_default().push(q_error);
                                }
                            }
                            Ok(None) => {}
                            Err(e) => {
                                errors.lock().get_or_insert(e);
                            }
                        }
                    })
                })
                .collect();
            drop(rx);

            for value in values {
                if errors.lock().is_some() || tx.send(value).is_err() {
                    break;
                }
            }
            drop(tx);

            workers.into_iter().map(|w| w.join()).any(|joined| joined.is_err())
        });

        if let Some(e) = first_error.into_inner() {
            return Err(e);
        }
        if panicked {
            return Err(CardError::WorkerPanicked {
                table: table.to_string(),
                column: column.to_string(),
            });
        }
        Ok(samples
            .into_inner()
            .into_iter()
            .map(|(bucket, values)| (bucket, Metrics::record(values)))
            .collect())
    }

    /// `lb <= col < ub` for every ordered pair of distinct non-null values.
    ///
    /// Stops at `deadline` and returns what was collected so far.
    pub fn probe_range(&self, table: &str, column: &str, deadline: Option<Instant>) -> CardResult<Metrics> {
        let (t, c) = (quote_table(table), quote_ident(column));
        let values: Vec<String> = self
            .values(table, column, &format!("SELECT DISTINCT {c} FROM {t} WHERE {c} IS NOT NULL ORDER BY {c}"))?
            .into_iter()
            .flatten()
            .collect();

        let mut samples = Vec::new();
        for (i, lb) in values.iter().enumerate() {
            for ub in &values[i + 1..] {
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    info!(table, column, probes = samples.len(), "range probe reached its deadline");
                    return Ok(Metrics::record(samples));
                }
                let sql = format!(
                    "SELECT {c} FROM {t} WHERE {c} >= {} AND {c} < {}",
                    quote_literal(lb),
                    quote_literal(ub)
                );
                if let Some(q_error) = self.first_q_error(table, column, &sql)? {
                    info!(table, column, lb = %lb, ub = %ub, q_error, "q-error result");
                    samples.push(q_error);
                }
            }
        }
        Ok(Metrics::record(samples))
    }

    fn exact_match_q_error(&self, table: &str, column: &str, value: Option<&str>) -> CardResult<Option<f64>> {
        let c = quote_ident(column);
        let predicate = match value {
            Some(v) => format!("{c} = {}", quote_literal(v)),
            None => format!("{c} IS NULL"),
        };
        let sql = format!("SELECT {c} FROM {} WHERE {predicate}", quote_table(table));
        let q_error = self.first_q_error(table, column, &sql)?;
        if let Some(q_error) = q_error {
            info!(table, column, value = value.unwrap_or("NULL"), q_error, "q-error result");
        }
        Ok(q_error)
    }

    /// Q-error of the topmost operator with both row counts, if finite.
    fn first_q_error(&self, table: &str, column: &str, sql: &str) -> CardResult<Option<f64>> {
        let explained = self
            .executor
            .explain_analyze(sql)
            .map_err(|e| CardError::execute(table, column, e))?;
        let Some(tree) = ExplainAnalyzeTree::parse(&explained.rows) else {
            debug!(sql, "unusable execution analysis");
            return Ok(None);
        };
        Ok(tree
            .cardinality()
            .first()
            .map(|info| info.q_error)
            .filter(|q| q.is_finite()))
    }

    fn distinct_count(&self, table: &str, column: &str) -> CardResult<usize> {
        let sql = format!("SELECT COUNT(DISTINCT({})) FROM {}", quote_ident(column), quote_table(table));
        let rows = self
            .executor
            .query(&sql)
            .map_err(|e| CardError::execute(table, column, e))?;
        let cell = rows.cell(0, 0);
        cell.and_then(|v| v.trim().parse().ok())
            .ok_or_else(|| CardError::MalformedCount {
                table: table.to_string(),
                column: column.to_string(),
                value: cell.map(str::to_string),
            })
    }

    /// First column of every row.
    fn values(&self, table: &str, column: &str, sql: &str) -> CardResult<Vec<Option<String>>> {
        let rows = self
            .executor
            .query(sql)
            .map_err(|e| CardError::execute(table, column, e))?;
        Ok(rows
            .data
            .into_iter()
            .map(|row| row.into_iter().next().flatten())
            .collect())
    }
}

fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// `db.t` quotes each part.
fn quote_table(name: &str) -> String {
    name.split('.').map(quote_ident).collect::<Vec<_>>().join(".")
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

//! Benchmark reports.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use ulid::Ulid;

use super::plan::{BenchmarkRun, PlanCandidate};
use super::session::BenchCollection;
use crate::metrics::Metrics;
use crate::table;

const HEADERS: [&str; 8] = [
    "id",
    "#plan space",
    "default execution time",
    "best plan execution time",
    "effectiveness",
    "better optimal plans",
    "estRow q-error",
    "query",
];

/// Base-table estimation error over every plan of a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QErrorSummary {
    pub count: usize,
    #[serde(rename = "50th")]
    pub p50: f64,
    #[serde(rename = "90th")]
    pub p90: f64,
    #[serde(rename = "95th")]
    pub p95: f64,
    pub max: f64,
}

impl QErrorSummary {
    fn of(metrics: &Metrics) -> Self {
        Self {
            count: metrics.len(),
            p50: metrics.quantile(0.5),
            p90: metrics.quantile(0.9),
            p95: metrics.quantile(0.95),
            max: metrics.quantile(1.0),
        }
    }
}

/// One benchmarked query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchRow {
    #[serde(rename = "queryID")]
    pub query_id: String,
    pub query: String,
    #[serde(rename = "planSpaceSize")]
    pub plan_space: usize,
    #[serde(rename = "defaultPlanID")]
    pub default_plan: usize,
    pub default_plan_dur: f64,
    pub default_plan_dur_dev: f64,
    pub best_plan_dur: f64,
    pub best_plan_dur_dev: f64,
    pub optimal_plan: Vec<String>,
    pub effectiveness: f64,
    #[serde(rename = "estRowsQError")]
    pub est_rows_q_error: QErrorSummary,
}

impl BenchRow {
    pub fn from_run(run: &BenchmarkRun) -> Self {
        let default = &run.default_plan;
        let better = run.better_plans();
        let best = better
            .iter()
            .copied()
            .filter(|p| p.timing.is_some())
            .min_by(|a, b| mean(a).total_cmp(&mean(b)))
            .unwrap_or(default);

        let optimal_plan = better
            .iter()
            .map(|p| format!("#{}({:.1}%)", p.plan_index, 100.0 * mean(p) / mean(default)))
            .collect();

        let effectiveness = if run.plan_space == 0 {
            1.0
        } else {
            (run.plan_space.saturating_sub(better.len())) as f64 / run.plan_space as f64
        };

        let mut seen = HashSet::new();
        let mut q_errors = Vec::new();
        for plan in std::iter::once(default).chain(&run.alternate_plans) {
            for info in plan.base_table_cardinality() {
                if seen.insert(info.operator_info().to_string()) {
                    q_errors.push(info.q_error);
                }
            }
        }

        Self {
            query_id: run.query_id.clone(),
            query: default.sql.clone(),
            plan_space: run.plan_space,
            default_plan: default.plan_index,
            default_plan_dur: mean(default),
            default_plan_dur_dev: spread(default),
            best_plan_dur: mean(best),
            best_plan_dur_dev: spread(best),
            optimal_plan,
            effectiveness,
            est_rows_q_error: QErrorSummary::of(&Metrics::record(q_errors)),
        }
    }

    fn cells(&self) -> Vec<String> {
        let q = &self.est_rows_q_error;
        vec![
            self.query_id.clone(),
            self.plan_space.to_string(),
            format!("{:2}: {:.1} ± {:.1}%", self.default_plan, self.default_plan_dur, self.default_plan_dur_dev),
            format!("{:.1} ± {:.1}%", self.best_plan_dur, self.best_plan_dur_dev),
            format!("{:.1}%", self.effectiveness * 100.0),
            self.optimal_plan.join(","),
            format!(
                "count: {}, median: {:.1}, 90th: {:.1}, 95th: {:.1}, max: {:.1}",
                q.count, q.p50, q.p90, q.p95, q.max
            ),
            self.query.clone(),
        ]
    }
}

/// A verification failure as reported.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureRow {
    #[serde(rename = "queryID")]
    pub query_id: String,
    #[serde(rename = "planID")]
    pub plan: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub query: String,
    pub expected: String,
    pub actual: String,
}

/// Report of one benchmark session.
#[derive(Debug, Clone, Serialize)]
pub struct BenchReport {
    pub session: Ulid,
    #[serde(rename = "generatedAt")]
    pub generated_at: DateTime<Utc>,
    pub metric: String,
    pub data: Vec<BenchRow>,
    pub failures: Vec<FailureRow>,
}

impl BenchReport {
    pub fn new(collection: &BenchCollection) -> Self {
        Self {
            session: Ulid::new(),
            generated_at: Utc::now(),
            metric: "execution time".to_string(),
            data: collection.runs.iter().map(BenchRow::from_run).collect(),
            failures: collection
                .failures
                .iter()
                .map(|f| FailureRow {
                    query_id: f.run.query_id.clone(),
                    plan: f.plan,
                    target: f.target.clone(),
                    query: f.sql.clone(),
                    expected: f.expected.to_string(),
                    actual: f.actual.to_string(),
                })
                .collect(),
        }
    }

    /// Aligned text table, followed by verification failures if any.
    pub fn to_table(&self) -> String {
        let rows: Vec<Vec<String>> = self.data.iter().map(BenchRow::cells).collect();
        let mut out = table::render(&HEADERS, &rows);
        if !self.failures.is_empty() {
            let rows: Vec<Vec<String>> = self
                .failures
                .iter()
                .map(|f| {
                    vec![
                        f.query_id.clone(),
                        format!("#{}", f.plan),
                        f.target.clone().unwrap_or_default(),
                        f.expected.clone(),
                        f.actual.clone(),
                    ]
                })
                .collect();
            out.push('\n');
            out.push_str(&table::render(&["id", "plan", "target", "expected", "actual"], &rows));
        }
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn mean(plan: &PlanCandidate) -> f64 {
    plan.timing.as_ref().map_or(f64::NAN, Metrics::mean)
}

fn spread(plan: &PlanCandidate) -> f64 {
    plan.timing.as_ref().map_or(0.0, Metrics::spread)
}

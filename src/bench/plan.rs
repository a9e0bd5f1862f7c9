//! Plan candidates and benchmark runs.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::executor::{Hints, Rows};
use crate::explain::{CardinalityInfo, ExplainAnalyzeTree};
use crate::metrics::Metrics;
use crate::sql::QueryKind;

static OPERATOR_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_\d+\b").expect("valid operator id regex"));

/// Structural description of a plan, taken from `EXPLAIN`.
///
/// Operator ids (`TableReader_5`) are numbered per optimization, so their
/// numeric suffix is dropped before comparing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PlanFingerprint(String);

impl PlanFingerprint {
    pub fn from_rows(rows: &Rows) -> Self {
        let lines: Vec<String> = rows
            .iter()
            .map(|row| {
                let cells: Vec<&str> = row
                    .iter()
                    .map(|c| c.as_deref().unwrap_or("NULL"))
                    .collect();
                OPERATOR_ID.replace_all(&cells.join("\t"), "").into_owned()
            })
            .collect();
        Self(lines.join("\n"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlanFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One point of the plan space.
#[derive(Debug, Clone)]
pub struct PlanCandidate {
    /// `0` is the optimizer's own choice, `1..` are forced plans.
    pub plan_index: usize,
    pub sql: String,
    pub hints: Hints,
    pub fingerprint: PlanFingerprint,
    /// `None` when execution was skipped after an ignored server error.
    pub timing: Option<Metrics>,
    pub explain_analyze: Option<ExplainAnalyzeTree>,
}

impl PlanCandidate {
    pub fn new(plan_index: usize, sql: impl Into<String>, hints: Hints, fingerprint: PlanFingerprint) -> Self {
        Self {
            plan_index,
            sql: sql.into(),
            hints,
            fingerprint,
            timing: None,
            explain_analyze: None,
        }
    }

    /// Estimation errors of row filters on base tables.
    pub fn base_table_cardinality(&self) -> Vec<CardinalityInfo<'_>> {
        self.cardinality_where(CardinalityInfo::is_base_table)
    }

    /// Estimation errors of joins.
    pub fn join_cardinality(&self) -> Vec<CardinalityInfo<'_>> {
        self.cardinality_where(CardinalityInfo::is_join)
    }

    fn cardinality_where<'a>(&'a self, keep: fn(&CardinalityInfo<'a>) -> bool) -> Vec<CardinalityInfo<'a>> {
        match &self.explain_analyze {
            Some(tree) => tree.cardinality().into_iter().filter(|c| keep(c)).collect(),
            None => Vec::new(),
        }
    }
}

/// The outcome of benchmarking one query across its plan space.
#[derive(Debug, Clone)]
pub struct BenchmarkRun {
    pub query_id: String,
    pub query_kind: QueryKind,
    pub round: usize,
    /// Number of forced plans the engine could produce.
    pub plan_space: usize,
    pub default_plan: PlanCandidate,
    /// Every enumerated plan except the default, in ascending index order.
    pub alternate_plans: Vec<PlanCandidate>,
    pub verification_failed: bool,
}

impl BenchmarkRun {
    /// Alternates that are measurably faster than the default.
    pub fn better_plans(&self) -> Vec<&PlanCandidate> {
        self.alternate_plans
            .iter()
            .filter(|p| super::is_sub_optimal(&self.default_plan, p))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn explain(ids: [&'static str; 2]) -> Rows {
        Rows::from_strings(
            ["id", "estRows", "task", "access object", "operator info"],
            vec![
                vec![ids[0], "10.00", "root", "", "data:Selection"],
                vec![ids[1], "10.00", "cop[tikv]", "table:t", "eq(t.a, 1)"],
            ],
        )
    }

    #[test]
    fn test_fingerprint_ignores_operator_numbering() {
        let a = PlanFingerprint::from_rows(&explain(["TableReader_7", "└─Selection_6"]));
        let b = PlanFingerprint::from_rows(&explain(["TableReader_12", "└─Selection_11"]));
        let c = PlanFingerprint::from_rows(&explain(["IndexReader_7", "└─IndexRangeScan_6"]));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.as_str().starts_with("TableReader\t10.00"));
    }

    #[test]
    fn test_cardinality_split() {
        let rows = Rows::from_strings(
            ["id", "estRows", "actRows", "operator info"],
            vec![
                vec!["HashJoin_8", "40.00", "10", "inner join"],
                vec!["├─Selection_4(Build)", "8.00", "2", "eq(t1.a, 1)"],
                vec!["│ └─TableFullScan_3", "100.00", "100", "keep order:false"],
                vec!["└─TableFullScan_5", "100.00", "100", "keep order:false"],
            ],
        );
        let mut plan = PlanCandidate::new(1, "SELECT 1", Hints::default(), PlanFingerprint::default());
        assert!(plan.base_table_cardinality().is_empty());

        plan.explain_analyze = ExplainAnalyzeTree::parse(&rows);
        let base = plan.base_table_cardinality();
        assert_eq!(base.len(), 1);
        assert_eq!(base[0].q_error, 4.0);
        let joins = plan.join_cardinality();
        assert_eq!(joins.len(), 1);
        assert_eq!(joins[0].node.operator(), "HashJoin");
    }
}

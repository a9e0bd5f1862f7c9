//! Estimation error of the cardinality estimator.

use std::fmt;

use super::tree::{ExplainAnalyzeTree, NodeRef};

/// Ratio between estimated and actual rows, always `>= 1`.
///
/// Infinite when either side is not positive.
pub fn q_error(est_rows: f64, act_rows: f64) -> f64 {
    if est_rows > 0.0 && act_rows > 0.0 {
        (est_rows / act_rows).max(act_rows / est_rows)
    } else {
        f64::INFINITY
    }
}

/// Coarse operator family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorClass {
    Join,
    Filter,
    Other,
}

impl OperatorClass {
    pub fn of(operator: &str) -> Self {
        if operator.contains("Join") {
            OperatorClass::Join
        } else if operator.contains("Selection") {
            OperatorClass::Filter
        } else {
            OperatorClass::Other
        }
    }
}

/// One operator with a measurable estimation error.
#[derive(Debug, Clone, Copy)]
pub struct CardinalityInfo<'t> {
    pub node: NodeRef<'t>,
    pub q_error: f64,
}

impl<'t> CardinalityInfo<'t> {
    pub fn class(&self) -> OperatorClass {
        OperatorClass::of(self.node.operator())
    }

    pub fn is_join(&self) -> bool {
        self.class() == OperatorClass::Join
    }

    /// Filters sit directly on top of base-table scans.
    pub fn is_base_table(&self) -> bool {
        self.class() == OperatorClass::Filter
    }

    pub fn operator_info(&self) -> &'t str {
        &self.node.node().operator_info
    }
}

impl fmt::Display for CardinalityInfo<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.node.node();
        write!(
            f,
            "{} est={} act={} q-error={:.2} [{}]",
            node.operator, node.est_rows, node.act_rows, self.q_error, node.operator_info
        )
    }
}

impl ExplainAnalyzeTree {
    /// Operators with both row counts positive, in pre-order.
    pub fn cardinality(&self) -> Vec<CardinalityInfo<'_>> {
        self.pre_order()
            .into_iter()
            .filter_map(|node| {
                let n = node.node();
                (n.est_rows > 0.0 && n.act_rows > 0.0).then(|| CardinalityInfo {
                    node,
                    q_error: q_error(n.est_rows, n.act_rows),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::Rows;

    #[test]
    fn test_q_error() {
        assert_eq!(q_error(10.0, 10.0), 1.0);
        assert_eq!(q_error(100.0, 10.0), 10.0);
        assert_eq!(q_error(10.0, 100.0), 10.0);
        assert_eq!(q_error(0.5, 2.0), q_error(2.0, 0.5));
        assert!(q_error(0.0, 5.0).is_infinite());
        assert!(q_error(5.0, 0.0).is_infinite());
        assert!(q_error(-1.0, 5.0).is_infinite());
        for (e, a) in [(1.0, 3.0), (7.5, 2.5), (1e6, 1.0)] {
            assert!(q_error(e, a) >= 1.0);
        }
    }

    #[test]
    fn test_operator_class() {
        assert_eq!(OperatorClass::of("HashJoin"), OperatorClass::Join);
        assert_eq!(OperatorClass::of("IndexMergeJoin"), OperatorClass::Join);
        assert_eq!(OperatorClass::of("Selection"), OperatorClass::Filter);
        assert_eq!(OperatorClass::of("TableFullScan"), OperatorClass::Other);
    }

    #[test]
    fn test_cardinality_skips_zero_counts_but_visits_children() {
        let rows = Rows::from_strings(
            ["id", "estRows", "actRows", "operator info"],
            vec![
                vec!["HashJoin_8", "40.00", "10", "inner join"],
                vec!["├─Selection_4(Build)", "0", "0", "eq(t1.a, 1)"],
                vec!["│ └─TableFullScan_3", "100.00", "100", "keep order:false"],
                vec!["└─Selection_6(Probe)", "5.00", "20", "gt(t2.b, 3)"],
                vec!["  └─TableFullScan_5", "100.00", "100", "keep order:false"],
            ],
        );
        let tree = ExplainAnalyzeTree::parse(&rows).unwrap();
        let infos = tree.cardinality();
        let ops: Vec<&str> = infos.iter().map(|i| i.node.operator()).collect();
        assert_eq!(ops, ["HashJoin", "TableFullScan", "Selection", "TableFullScan"]);
        assert_eq!(infos[0].q_error, 4.0);
        assert!(infos[0].is_join());
        assert!(infos[2].is_base_table());
        assert_eq!(infos[2].q_error, 4.0);
        assert_eq!(infos[2].operator_info(), "gt(t2.b, 3)");
    }
}

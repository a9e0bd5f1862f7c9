//! Execution-analysis report parsing.
//!
//! `EXPLAIN ANALYZE` prints the operator tree pre-order, one operator per
//! row, with nesting encoded by tree-drawing glyphs in the `id` column:
//!
//! ```text
//! HashAgg_30
//! └─HashJoin_45
//!   ├─TableReader_308(Build)
//!   │ └─TableFullScan_307
//!   └─HashJoin_74(Probe)
//! ```
//!
//! Nodes live in an arena owned by [`ExplainAnalyzeTree`]; children and the
//! parent back-reference are indices into it.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::executor::Rows;

static OPERATOR_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[a-zA-Z]+").expect("valid operator regex"));

/// Leading columns every execution-analysis report must start with.
const EXPECTED_HEADER: [&str; 3] = ["id", "estRows", "actRows"];

const OPERATOR_INFO: &str = "operator info";

/// Index of a node inside its tree.
pub type NodeId = usize;

/// One operator of an execution-analysis report.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplainAnalyzeNode {
    pub operator: String,
    pub est_rows: f64,
    pub act_rows: f64,
    pub operator_info: String,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

/// Operator tree rebuilt from an execution-analysis report.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplainAnalyzeTree {
    nodes: Vec<ExplainAnalyzeNode>,
}

impl ExplainAnalyzeTree {
    /// Rebuild the tree from report rows.
    ///
    /// Returns `None` when the header does not start with
    /// `id, estRows, actRows`, when the report is empty, or when the
    /// indentation climbs above the root.
    pub fn parse(rows: &Rows) -> Option<Self> {
        let header_ok = rows.columns.len() >= EXPECTED_HEADER.len()
            && rows.columns.iter().zip(EXPECTED_HEADER).all(|(c, e)| c == e);
        if !header_ok {
            debug!(columns = ?rows.columns, "unexpected execution-analysis header");
            return None;
        }
        let info_column = rows
            .column_index(OPERATOR_INFO)
            .unwrap_or(rows.columns.len() - 1);

        let mut nodes: Vec<ExplainAnalyzeNode> = Vec::with_capacity(rows.len());
        let mut cursor: NodeId = 0;
        let mut cursor_depth = 0usize;

        for (index, row) in rows.iter().enumerate() {
            let cell = |i: usize| row.get(i).and_then(|c| c.as_deref()).unwrap_or("");
            let (operator, depth) = parse_operator_id(cell(0))?;
            let node = ExplainAnalyzeNode {
                operator,
                est_rows: parse_row_count(cell(1)),
                act_rows: parse_row_count(cell(2)),
                operator_info: cell(info_column).to_string(),
                children: Vec::new(),
                parent: None,
            };

            let id = nodes.len();
            if index > 0 {
                let mut parent = cursor;
                for _ in 0..(cursor_depth + 1).saturating_sub(depth) {
                    parent = nodes[parent].parent?;
                }
                nodes[parent].children.push(id);
                nodes.push(ExplainAnalyzeNode {
                    parent: Some(parent),
                    ..node
                });
            } else {
                nodes.push(node);
            }
            cursor = id;
            cursor_depth = depth;
        }

        if nodes.is_empty() {
            return None;
        }
        Some(Self { nodes })
    }

    /// The first reported operator.
    pub fn root(&self) -> NodeRef<'_> {
        NodeRef { tree: self, id: 0 }
    }

    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        (id < self.nodes.len()).then_some(NodeRef { tree: self, id })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in pre-order.
    pub fn pre_order(&self) -> Vec<NodeRef<'_>> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![0];
        while let Some(id) = stack.pop() {
            out.push(NodeRef { tree: self, id });
            stack.extend(self.nodes[id].children.iter().rev());
        }
        out
    }
}

/// A borrowed view of one node and its position in the tree.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'t> {
    tree: &'t ExplainAnalyzeTree,
    id: NodeId,
}

impl<'t> NodeRef<'t> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node(&self) -> &'t ExplainAnalyzeNode {
        &self.tree.nodes[self.id]
    }

    pub fn operator(&self) -> &'t str {
        &self.node().operator
    }

    pub fn parent(&self) -> Option<NodeRef<'t>> {
        self.node().parent.map(|id| NodeRef { tree: self.tree, id })
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'t>> + 't {
        let tree = self.tree;
        self.node()
            .children
            .iter()
            .map(move |&id| NodeRef { tree, id })
    }

    pub fn child(&self, index: usize) -> Option<NodeRef<'t>> {
        self.children().nth(index)
    }
}

/// Operator name and nesting depth from an `id` cell.
fn parse_operator_id(id: &str) -> Option<(String, usize)> {
    let name = OPERATOR_NAME.find(id)?;
    let depth = id[..name.start()].chars().count() / 2;
    Some((name.as_str().to_string(), depth))
}

fn parse_row_count(cell: &str) -> f64 {
    cell.trim().parse::<f64>().unwrap_or(0.0)
}

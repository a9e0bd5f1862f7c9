//! Execution-analysis trees and cardinality estimation error.

mod cardinality;
mod tree;

pub use cardinality::{q_error, CardinalityInfo, OperatorClass};
pub use tree::{ExplainAnalyzeNode, ExplainAnalyzeTree, NodeId, NodeRef};

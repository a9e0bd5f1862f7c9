//! Statement classification and plan-hint injection.
//!
//! Uses the `sqlparser` crate only to understand what kind of statement a
//! workload query is and where its optimizer hint block lives; the engine
//! under test does the real parsing.

mod error;
mod hint;
mod query;

pub use error::{ParseError, ParseResult};
pub use hint::{split_hint_list, with_plan_hint, PLAN_HINT};
pub use query::{Query, QueryKind, SortKey};

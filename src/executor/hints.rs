//! Optimizer hint sets as reported by `EXPLAIN FORMAT = 'hint'`.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::sql::split_hint_list;

/// A normalized, order-independent set of hints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Hints(BTreeSet<String>);

impl Hints {
    /// Parse a comma separated hint list.
    ///
    /// Commas nested in parentheses belong to the hint, e.g.
    /// `hash_join(t1, t2)` stays one entry.
    pub fn parse(raw: &str) -> Self {
        Self(split_hint_list(raw).into_iter().collect())
    }

    /// Drop any plan-selection hint.
    pub fn without_plan_hint(mut self) -> Self {
        self.0.retain(|h| !h.to_lowercase().contains("nth_plan"));
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl fmt::Display for Hints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hints: Vec<&str> = self.iter().collect();
        write!(f, "{}", hints.join(", "))
    }
}

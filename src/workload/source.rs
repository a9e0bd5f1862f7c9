//! Where benchmarked queries come from.

use std::collections::VecDeque;

use crate::sql::Query;

/// A pull-based supplier of queries.
pub trait QuerySource {
    /// The next query, or `None` once the source is exhausted.
    fn next_query(&mut self) -> Option<Query>;
}

/// In-memory queries served in insertion order.
#[derive(Debug, Clone, Default)]
pub struct QueryList {
    queries: VecDeque<Query>,
}

impl QueryList {
    pub fn new(queries: impl IntoIterator<Item = Query>) -> Self {
        Self {
            queries: queries.into_iter().collect(),
        }
    }

    pub fn push(&mut self, query: Query) {
        self.queries.push_back(query);
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

impl QuerySource for QueryList {
    fn next_query(&mut self) -> Option<Query> {
        self.queries.pop_front()
    }
}

impl<S: QuerySource + ?Sized> QuerySource for Box<S> {
    fn next_query(&mut self) -> Option<Query> {
        (**self).next_query()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_list_order() {
        let mut list = QueryList::new([
            Query::new("a", "SELECT 1").unwrap(),
            Query::new("b", "SELECT 2").unwrap(),
        ]);
        list.push(Query::new("c", "DELETE FROM t").unwrap());
        assert_eq!(list.len(), 3);

        let ids: Vec<String> = std::iter::from_fn(|| list.next_query())
            .map(|q| q.id().to_string())
            .collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert!(list.next_query().is_none());
    }
}

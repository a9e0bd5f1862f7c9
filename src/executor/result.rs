//! Query result types.

use std::fmt;

use serde::Serialize;

use crate::sql::SortKey;
use crate::table;

/// One row; `None` is SQL NULL.
pub type Row = Vec<Option<String>>;

/// A tabular result as text cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Rows {
    /// Column names in order.
    pub columns: Vec<String>,
    /// Rows in the order the engine returned them.
    pub data: Vec<Row>,
}

impl Rows {
    /// Create an empty result with the given header.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            data: Vec::new(),
        }
    }

    /// Create from string literals; `"NULL"` is not special here.
    pub fn from_strings<C, R>(columns: C, rows: R) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        R: IntoIterator<Item = Vec<&'static str>>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            data: rows
                .into_iter()
                .map(|row| row.into_iter().map(|c| Some(c.to_string())).collect())
                .collect(),
        }
    }

    /// Add a row.
    pub fn push(&mut self, row: Row) {
        self.data.push(row);
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Cell at (row, column), flattening NULL to `None`.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.data.get(row)?.get(column)?.as_deref()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Iterate over rows.
    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.data.iter()
    }

    /// Aligned text table, NULL printed as `NULL`.
    pub fn to_table(&self) -> String {
        let headers: Vec<&str> = self.columns.iter().map(String::as_str).collect();
        let cells: Vec<Vec<String>> = self
            .data
            .iter()
            .map(|row| row.iter().map(|c| c.as_deref().unwrap_or("NULL").to_string()).collect())
            .collect();
        table::render(&headers, &cells)
    }

    /// Same rows in a canonical order, for results whose order is unspecified.
    pub fn sorted(mut self) -> Self {
        self.data.sort();
        self
    }

    /// Sort each run of consecutive rows that tie on every key column.
    ///
    /// Rows must already be ordered by the keys; the order between runs is
    /// left alone.
    pub fn sorted_within_ties(mut self, keys: &[usize]) -> Self {
        let mut start = 0;
        while start < self.data.len() {
            let head = &self.data[start];
            let len = self.data[start..]
                .iter()
                .take_while(|row| keys.iter().all(|&k| row.get(k) == head.get(k)))
                .count();
            self.data[start..start + len].sort();
            start += len;
        }
        self
    }
}

impl IntoIterator for Rows {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl fmt::Display for Rows {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, row) in self.data.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            let cells: Vec<&str> = row.iter().map(|c| c.as_deref().unwrap_or("NULL")).collect();
            write!(f, "({})", cells.join(", "))?;
        }
        write!(f, "]")
    }
}

/// What executing a statement produced; compared structurally across plans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// Rows returned by a read.
    Rows(Rows),
    /// Rows affected by a write.
    Affected(u64),
}

impl QueryOutcome {
    /// Canonical form for comparison under a top-level `ORDER BY`.
    ///
    /// Without one, rows compare as a multiset. With one, only the order of
    /// rows with different keys counts. Keys that are not plain output
    /// columns keep the engine's order as is.
    pub fn normalized(self, order_by: &[SortKey]) -> Self {
        let QueryOutcome::Rows(rows) = self else {
            return self;
        };
        if order_by.is_empty() {
            return QueryOutcome::Rows(rows.sorted());
        }
        let keys: Option<Vec<usize>> = order_by.iter().map(|k| k.resolve(&rows.columns)).collect();
        match keys {
            Some(keys) => QueryOutcome::Rows(rows.sorted_within_ties(&keys)),
            None => QueryOutcome::Rows(rows),
        }
    }
}

impl fmt::Display for QueryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryOutcome::Rows(rows) => write!(f, "{} row(s) {}", rows.len(), rows),
            QueryOutcome::Affected(n) => write!(f, "{} row(s) affected", n),
        }
    }
}

//! Workload queries.

use std::fmt;

use serde::Serialize;
use sqlparser::ast as sp;
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser as SqlParser;

use super::error::{ParseError, ParseResult};

/// Decides how results are compared across plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    /// Compared by returned rows.
    Read,
    /// Compared by affected row count.
    Write,
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKind::Read => write!(f, "read"),
            QueryKind::Write => write!(f, "write"),
        }
    }
}

/// One top-level `ORDER BY` item, as far as it can be found in the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    /// Output column with this name.
    Column(String),
    /// 1-based output column position, `ORDER BY 2`.
    Position(usize),
    /// Any other expression.
    Expression,
}

impl SortKey {
    fn from_expr(expr: &sp::Expr) -> Self {
        match expr {
            sp::Expr::Identifier(ident) => SortKey::Column(ident.value.clone()),
            sp::Expr::CompoundIdentifier(parts) => match parts.last() {
                Some(ident) => SortKey::Column(ident.value.clone()),
                None => SortKey::Expression,
            },
            sp::Expr::Value(v) => match &v.value {
                sp::Value::Number(n, _) => n.parse().map_or(SortKey::Expression, SortKey::Position),
                _ => SortKey::Expression,
            },
            sp::Expr::Nested(inner) => SortKey::from_expr(inner),
            _ => SortKey::Expression,
        }
    }

    /// Index of the key among `columns`.
    pub fn resolve(&self, columns: &[String]) -> Option<usize> {
        match self {
            SortKey::Column(name) => columns.iter().position(|c| c.eq_ignore_ascii_case(name)),
            SortKey::Position(p) => p.checked_sub(1).filter(|&i| i < columns.len()),
            SortKey::Expression => None,
        }
    }
}

/// A single workload statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    id: String,
    sql: String,
    kind: QueryKind,
    order_by: Vec<SortKey>,
}

impl Query {
    /// Parse and classify a statement.
    pub fn new(id: impl Into<String>, sql: impl Into<String>) -> ParseResult<Self> {
        let sql = sql.into().trim().to_string();
        let statement = parse_single(&sql)?;
        let kind = classify_statement(&statement)?;
        let order_by = top_level_order(&statement);
        Ok(Self {
            id: id.into(),
            sql,
            kind,
            order_by,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    /// Whether the statement has a top-level `ORDER BY`.
    pub fn is_ordered(&self) -> bool {
        !self.order_by.is_empty()
    }

    /// Keys of the top-level `ORDER BY`, empty when the row order is
    /// unspecified.
    pub fn order_by(&self) -> &[SortKey] {
        &self.order_by
    }

    /// Classify a single statement as a read or a write.
    pub fn classify(sql: &str) -> ParseResult<QueryKind> {
        classify_statement(&parse_single(sql)?)
    }
}

fn parse_single(sql: &str) -> ParseResult<sp::Statement> {
    if sql.trim().is_empty() {
        return Err(ParseError::EmptyQuery);
    }

    let dialect = MySqlDialect {};
    let mut statements = SqlParser::parse_sql(&dialect, sql)?;
    match statements.len() {
        0 => Err(ParseError::EmptyQuery),
        1 => Ok(statements.remove(0)),
        _ => Err(ParseError::MultipleStatements),
    }
}

fn top_level_order(statement: &sp::Statement) -> Vec<SortKey> {
    let sp::Statement::Query(query) = statement else {
        return Vec::new();
    };
    match query.order_by.as_ref().map(|o| &o.kind) {
        Some(sp::OrderByKind::Expressions(exprs)) => exprs.iter().map(|e| SortKey::from_expr(&e.expr)).collect(),
        Some(sp::OrderByKind::All(_)) => vec![SortKey::Expression],
        None => Vec::new(),
    }
}

fn classify_statement(statement: &sp::Statement) -> ParseResult<QueryKind> {
    match statement {
        sp::Statement::Query(_) => Ok(QueryKind::Read),
        sp::Statement::Insert(_) | sp::Statement::Update { .. } | sp::Statement::Delete(_) => {
            Ok(QueryKind::Write)
        }
        other => Err(ParseError::UnsupportedStatement(first_words(&other.to_string()))),
    }
}

fn first_words(sql: &str) -> String {
    sql.split_whitespace().take(3).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_reads() {
        let q = Query::new("q1", "SELECT a, COUNT(*) FROM t WHERE b > 1 GROUP BY a;").unwrap();
        assert_eq!(q.kind(), QueryKind::Read);
        assert_eq!(
            Query::classify("SELECT 1 UNION SELECT 2").unwrap(),
            QueryKind::Read
        );
    }

    #[test]
    fn test_classify_writes() {
        for sql in [
            "INSERT INTO t (a) VALUES (1)",
            "UPDATE t SET a = 2 WHERE b = 3",
            "DELETE FROM t WHERE a = 1",
        ] {
            assert_eq!(Query::classify(sql).unwrap(), QueryKind::Write, "{}", sql);
        }
    }

    #[test]
    fn test_classify_ignores_hint_comments() {
        let q = Query::new("q2", "SELECT /*+ NTH_PLAN(2) */ * FROM t").unwrap();
        assert_eq!(q.kind(), QueryKind::Read);
    }

    #[test]
    fn test_detects_top_level_order_by() {
        assert!(Query::new("o", "SELECT a FROM t ORDER BY a").unwrap().is_ordered());
        assert!(!Query::new("u", "SELECT a FROM t").unwrap().is_ordered());
        assert!(!Query::new("s", "SELECT * FROM (SELECT a FROM t ORDER BY a) x")
            .unwrap()
            .is_ordered());
        assert!(!Query::new("w", "DELETE FROM t WHERE a = 1").unwrap().is_ordered());
    }

    #[test]
    fn test_order_by_keys() {
        let q = Query::new("o", "SELECT t.a, b AS c, d FROM t ORDER BY t.a, c DESC, 3, a + d").unwrap();
        assert_eq!(
            q.order_by(),
            [
                SortKey::Column("a".into()),
                SortKey::Column("c".into()),
                SortKey::Position(3),
                SortKey::Expression,
            ]
        );

        let columns: Vec<String> = ["a", "C", "d"].map(String::from).to_vec();
        assert_eq!(q.order_by()[0].resolve(&columns), Some(0));
        assert_eq!(q.order_by()[1].resolve(&columns), Some(1));
        assert_eq!(q.order_by()[2].resolve(&columns), Some(2));
        assert_eq!(q.order_by()[3].resolve(&columns), None);
        assert_eq!(SortKey::Position(4).resolve(&columns), None);
        assert_eq!(SortKey::Position(0).resolve(&columns), None);
    }

    #[test]
    fn test_classify_rejects() {
        assert!(matches!(Query::classify("  "), Err(ParseError::EmptyQuery)));
        assert!(matches!(
            Query::classify("SELECT 1; SELECT 2"),
            Err(ParseError::MultipleStatements)
        ));
        assert!(matches!(
            Query::classify("CREATE TABLE t (a INT)"),
            Err(ParseError::UnsupportedStatement(_))
        ));
        assert!(matches!(Query::classify("SELEC 1"), Err(ParseError::Syntax(_))));
    }
}

pub mod bench;
pub mod card;
pub mod explain;
pub mod hint;
pub mod query;

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use horoscope::sql::{with_plan_hint, Query};

use crate::cli::PlanArgs;

/// Print a rendered report, or write it to `output`.
fn emit(rendered: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, rendered).with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "report written");
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

/// The statement from the command line or stdin, with `--plan` forced.
fn forced_statement(args: &PlanArgs) -> Result<(Query, String)> {
    let sql = match &args.sql {
        Some(sql) => sql.clone(),
        None => {
            let mut sql = String::new();
            io::stdin().read_to_string(&mut sql).context("failed to read the statement from stdin")?;
            sql
        }
    };
    if sql.trim().is_empty() {
        bail!("no statement given");
    }

    let query = Query::new("cli", sql).context("unsupported statement")?;
    let forced = with_plan_hint(query.sql(), args.plan).context("cannot force a plan on the statement")?;
    debug!(plan = args.plan, sql = %forced, "forced statement");
    Ok((query, forced))
}

#[cfg(test)]
mod tests {
    use horoscope::sql::QueryKind;

    use super::*;

    fn args(plan: usize, sql: &str) -> PlanArgs {
        PlanArgs {
            plan,
            sql: Some(sql.to_string()),
        }
    }

    #[test]
    fn test_forced_statement() {
        let (query, sql) = forced_statement(&args(3, "SELECT a FROM t WHERE b = 1;")).unwrap();
        assert_eq!(query.kind(), QueryKind::Read);
        assert_eq!(sql, "SELECT /*+ NTH_PLAN(3) */ a FROM t WHERE b = 1;");

        let (query, sql) = forced_statement(&args(0, "DELETE FROM t WHERE a = 1")).unwrap();
        assert_eq!(query.kind(), QueryKind::Write);
        assert_eq!(sql, "DELETE FROM t WHERE a = 1");
    }

    #[test]
    fn test_forced_statement_rejects() {
        assert!(forced_statement(&args(1, "   ")).is_err());
        assert!(forced_statement(&args(1, "CREATE TABLE t (a INT)")).is_err());
        assert!(forced_statement(&args(1, "WITH x AS (SELECT 1) SELECT * FROM x")).is_err());
    }
}

use std::time::Instant;

use anyhow::{Context, Result};
use tracing::debug;

use horoscope::executor::{Executor, MysqlClient, QueryOutcome};
use horoscope::metrics::Metrics;

use crate::cli::QueryArgs;

pub fn run(client: MysqlClient, args: QueryArgs) -> Result<()> {
    let (query, sql) = super::forced_statement(&args.statement)?;

    let mut samples = Vec::with_capacity(args.round.max(1));
    let mut first = None;
    for _ in 0..args.round.max(1) {
        let start = Instant::now();
        let outcome = client
            .run(&sql, query.kind())
            .with_context(|| format!("plan #{} failed", args.statement.plan))?;
        samples.push(start.elapsed().as_secs_f64() * 1000.0);
        first.get_or_insert(outcome);
    }
    debug!(query = %sql, "complete query");

    match first {
        Some(QueryOutcome::Rows(rows)) => println!("{}", rows.to_table()),
        Some(affected) => println!("{}", affected),
        None => {}
    }
    println!("Complete in {}", Metrics::record(samples).with_unit("ms"));
    Ok(())
}

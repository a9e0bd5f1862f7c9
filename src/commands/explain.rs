use anyhow::{Context, Result};
use tracing::warn;

use horoscope::executor::{Executor, MysqlClient};

use crate::cli::PlanArgs;

pub fn run(client: MysqlClient, args: PlanArgs) -> Result<()> {
    let (_, sql) = super::forced_statement(&args)?;
    let explained = client
        .explain_analyze(&sql)
        .with_context(|| format!("failed to explain plan #{}", args.plan))?;
    for warning in &explained.warnings {
        warn!(plan = args.plan, %warning, "engine warning");
    }
    println!("{}", explained.rows.to_table());
    Ok(())
}

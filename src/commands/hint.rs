use anyhow::{Context, Result};

use horoscope::executor::{Executor, MysqlClient};

use crate::cli::PlanArgs;

pub fn run(client: MysqlClient, args: PlanArgs) -> Result<()> {
    let (_, sql) = super::forced_statement(&args)?;
    let hints = client
        .get_hints(&sql)
        .with_context(|| format!("failed to get hints of plan #{}", args.plan))?;
    println!("{}", hints);
    Ok(())
}

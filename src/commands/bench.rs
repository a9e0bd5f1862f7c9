use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::info;

use horoscope::bench::{run_session, BenchConfig, BenchOptions, BenchReport, Differential, Horoscope};
use horoscope::executor::MysqlClient;
use horoscope::workload::{self, WorkloadLoader};

use crate::cli::{BenchArgs, OutputFormat};

pub fn run(client: MysqlClient, args: BenchArgs) -> Result<()> {
    info!(
        target_db = %client.target(),
        workload = %args.workload.display(),
        round = args.round,
        "bench requested"
    );

    if args.prepare {
        workload::prepare(&client, &args.workload)
            .with_context(|| format!("failed to prepare {}", args.workload.display()))?;
    }
    let loader = WorkloadLoader::open(&args.workload)
        .with_context(|| format!("failed to open workload {}", args.workload.display()))?;

    let differential: Vec<Differential> = args
        .differential
        .iter()
        .map(|target| Differential::new(target.to_string(), MysqlClient::new(target.clone())))
        .collect();
    let config = BenchConfig::default()
        .collect_cardinality(!args.no_cardinality_error)
        .retry_cooldown(Duration::from_secs(args.retry_cooldown))
        .max_retries(args.max_retries);
    let options = BenchOptions::default()
        .round(args.round)
        .max_plans(args.max_plans)
        .verify(!args.no_verify)
        .ignore_server_errors(args.ignore_server_error);

    let mut horo = Horoscope::new(client, loader)
        .with_config(config)
        .with_differential(differential);
    let collection = run_session(&mut horo, &options).context("benchmark aborted")?;

    let report = BenchReport::new(&collection);
    let rendered = match args.format {
        OutputFormat::Table => report.to_table(),
        OutputFormat::Json => report.to_json().context("failed to serialize report")?,
    };
    super::emit(&rendered, args.output.as_deref())?;

    if collection.has_failures() {
        bail!("{} queries failed result verification", collection.failures.len());
    }
    Ok(())
}

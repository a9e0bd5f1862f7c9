use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use horoscope::card::{parse_columns, CardConfig, Cardinalitor};
use horoscope::executor::MysqlClient;

use crate::cli::{CardArgs, OutputFormat};

pub fn run(client: MysqlClient, args: CardArgs) -> Result<()> {
    let columns = parse_columns(&args.columns).context("invalid --columns")?;
    info!(
        target_db = %client.target(),
        columns = %args.columns,
        probe = ?args.probe,
        "card requested"
    );

    let card = Cardinalitor::new(client).with_config(CardConfig::default().concurrency(args.concurrency));
    let report = card
        .run_all(&columns, args.probe.into(), args.timeout.map(Duration::from_secs))
        .context("cardinality probe failed")?;

    let rendered = match args.format {
        OutputFormat::Table => report.to_table(),
        OutputFormat::Json => report.to_json().context("failed to serialize report")?,
    };
    super::emit(&rendered, args.output.as_deref())
}

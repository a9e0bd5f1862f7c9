mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use horoscope::executor::MysqlClient;

use crate::cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_json);

    if let Err(err) = run(cli) {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let client = MysqlClient::new(cli.target);

    match cli.command {
        Commands::Bench(args) => commands::bench::run(client, args),
        Commands::Card(args) => commands::card::run(client, args),
        Commands::Hint(args) => commands::hint::run(client, args),
        Commands::Explain(args) => commands::explain::run(client, args),
        Commands::Query(args) => commands::query::run(client, args),
    }
}

fn init_tracing(default_level: &str, json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

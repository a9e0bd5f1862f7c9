use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use horoscope::card::ProbeMode;
use horoscope::executor::MysqlTarget;

#[derive(Parser, Debug)]
#[command(
    name = "horoscope",
    version,
    about = "Plan-space differential testing and benchmarking for SQL optimizers"
)]
pub struct Cli {
    /// Database under test, `user[:password]@host[:port]/database`.
    #[arg(long, global = true, default_value = "root@127.0.0.1:4000/test")]
    pub target: MysqlTarget,

    /// Default log filter when `RUST_LOG` is unset.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[arg(long, global = true, default_value_t = false)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Benchmark every plan of every workload query.
    Bench(BenchArgs),
    /// Measure cardinality estimation error on single columns.
    Card(CardArgs),
    /// Print the optimizer hints of one forced plan.
    #[command(alias = "H")]
    Hint(PlanArgs),
    /// `EXPLAIN ANALYZE` one forced plan.
    #[command(alias = "e")]
    Explain(PlanArgs),
    /// Run one forced plan and report its latency.
    #[command(alias = "q")]
    Query(QueryArgs),
}

#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    /// Plan to force; 0 leaves the choice to the optimizer.
    #[arg(long, short = 'p', default_value_t = 0)]
    pub plan: usize,

    /// Statement to run; read from stdin when omitted.
    pub sql: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    #[command(flatten)]
    pub statement: PlanArgs,

    #[arg(long, default_value_t = 1)]
    pub round: usize,
}

#[derive(Args, Debug, Clone)]
pub struct BenchArgs {
    /// Directory with `queries/` and an optional `prepare.sql`.
    #[arg(long, default_value = "workload")]
    pub workload: PathBuf,

    /// Run the workload's `prepare.sql` first.
    #[arg(long, default_value_t = false)]
    pub prepare: bool,

    #[arg(long, default_value_t = 1)]
    pub round: usize,

    #[arg(long, default_value_t = 1000)]
    pub max_plans: usize,

    #[arg(long, default_value_t = false)]
    pub no_verify: bool,

    #[arg(long, default_value_t = false)]
    pub ignore_server_error: bool,

    /// Skip `EXPLAIN ANALYZE` collection.
    #[arg(long, default_value_t = false)]
    pub no_cardinality_error: bool,

    /// Additional engine whose results must match the target's.
    #[arg(long = "differential")]
    pub differential: Vec<MysqlTarget>,

    /// Seconds to wait before retrying after a connection failure.
    #[arg(long, default_value_t = 120)]
    pub retry_cooldown: u64,

    #[arg(long)]
    pub max_retries: Option<usize>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Write the report here instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct CardArgs {
    /// Columns to probe, `t1.c1,t1.c2,t2.c1`.
    #[arg(long)]
    pub columns: String,

    #[arg(long = "type", short = 't', value_enum, default_value_t = CardType::Emq)]
    pub probe: CardType,

    /// Stop range probing after this many seconds.
    #[arg(long)]
    pub timeout: Option<u64>,

    #[arg(long, default_value_t = horoscope::card::DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CardType {
    /// Exact match, `col = v`.
    Emq,
    /// Range, `lb <= col < ub`.
    Rge,
}

impl From<CardType> for ProbeMode {
    fn from(value: CardType) -> Self {
        match value {
            CardType::Emq => ProbeMode::Emq,
            CardType::Rge => ProbeMode::Rge,
        }
    }
}

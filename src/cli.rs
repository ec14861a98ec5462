use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "calllog")]
#[command(about = "Synthesize call-detail records and bulk-write them to a document store", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log every settled write, not just failures
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate calls and write them to the configured store
    Insert(InsertArgs),
    /// Generate calls and print them as JSON lines, one per record
    Generate(GenerateArgs),
}

#[derive(clap::Args, Debug)]
pub struct RecordArgs {
    /// Number of calls to generate (overrides generator.count)
    #[arg(short, long)]
    pub count: Option<usize>,

    /// Spread start times over this many past days (overrides generator.offset_days)
    #[arg(short, long)]
    pub offset: Option<u32>,

    /// Subscriber number all calls belong to; random when omitted
    #[arg(long)]
    pub caller: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct InsertArgs {
    #[command(flatten)]
    pub records: RecordArgs,

    /// Configuration file (defaults to $CALLLOG_CONFIG or config/calllog.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Exit non-zero when any record was skipped, rejected or lost in transport
    #[arg(long)]
    pub strict: bool,
}

#[derive(clap::Args, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub records: RecordArgs,

    /// Configuration file; only the [generator] section is used
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Seed the generator for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,
}

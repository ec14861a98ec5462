mod cli;
mod runner;

use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    calllog::observability::init_tracing(cli.verbose);

    match cli.command {
        Commands::Insert(args) => runner::insert(args).await?,
        Commands::Generate(args) => runner::generate(args)?,
    }

    Ok(())
}

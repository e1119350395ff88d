mod cli;
mod host;

use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    monitpull::observability::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => host::run(args.config).await?,
        Commands::Once(args) => host::once(args.config).await?,
    }

    Ok(())
}

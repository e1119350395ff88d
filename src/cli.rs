use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "monitpull")]
#[command(about = "Poll a Monit status endpoint and emit one record per service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll on the configured interval until interrupted
    Run(ConfigArgs),
    /// Run a single cycle and exit
    Once(ConfigArgs),
}

#[derive(clap::Args, Debug)]
pub struct ConfigArgs {
    /// Configuration file (defaults to $MONITPULL_CONFIG or config/monitpull.toml)
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

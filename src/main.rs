use clap::Parser;
use offline_gateway::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => cli::serve::run().await,
        Command::Provision => cli::provision::run().await,
        Command::Partitions(args) => cli::partitions::run(args).await,
    }
}

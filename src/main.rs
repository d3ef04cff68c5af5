#![allow(non_snake_case)]

use clap::Parser;
use scheduleBot::cli::Cli;
use scheduleBot::runtime;

// Projects run one after another; there is nothing to fan out.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    runtime::run(&cli).await?;
    Ok(())
}

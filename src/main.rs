//! yottaci CLI binary.
//!
//! Thin entrypoint; all logic lives in the library crates.

use clap::Parser as _;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    yottaci::logging::init();
    let cli = yottaci::cli::Cli::parse();
    yottaci::cli::run(cli).await
}

//! Command-line interface.

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// Single-shot CI build orchestrator for OpenEmbedded/bitbake targets.
#[derive(Debug, Parser)]
#[command(name = "yottaci", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run one build task to a terminal state.
    Run(RunArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Path to the persisted task document.
    #[arg(long, default_value = "/etc/taskdata.json")]
    pub taskdata: Utf8PathBuf,

    /// Durable shared storage root (git mirrors, caches, diagnostics).
    #[arg(long, default_value = "/fileshare")]
    pub fileshare: Utf8PathBuf,

    /// Node-local scratch root holding the per-run workspace.
    #[arg(long, default_value = "/data/yottaci")]
    pub workdir: Utf8PathBuf,
}

/// Parse arguments and dispatch.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run(args) => crate::startup::run_task(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_layout() {
        let cli = Cli::parse_from(["yottaci", "run"]);
        let Commands::Run(args) = cli.command;
        assert_eq!(args.taskdata, "/etc/taskdata.json");
        assert_eq!(args.fileshare, "/fileshare");
        assert_eq!(args.workdir, "/data/yottaci");
    }

    #[test]
    fn paths_are_overridable() {
        let cli = Cli::parse_from([
            "yottaci",
            "run",
            "--taskdata",
            "/tmp/task.json",
            "--fileshare",
            "/mnt/share",
            "--workdir",
            "/tmp/scratch",
        ]);
        let Commands::Run(args) = cli.command;
        assert_eq!(args.taskdata, "/tmp/task.json");
        assert_eq!(args.fileshare, "/mnt/share");
        assert_eq!(args.workdir, "/tmp/scratch");
    }
}

//! kuwetex-server - runs the litter box simulation and serves clients
//!
//! Usage:
//!   kuwetex-server            - Start on 127.0.0.1:5555, stop with Ctrl-C

use clap::Parser;
use cli::commands::ServeCommand;
use shared::KuwetexConfig;

#[derive(Parser)]
#[command(name = "kuwetex-server")]
#[command(about = "Kuwetex - Smart litter box server")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    command: ServeCommand,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::init_logging();

    let cli = Cli::parse();
    cli.command.run(KuwetexConfig::default()).await
}

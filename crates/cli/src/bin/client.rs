//! kuwetex-client - one request to a running Kuwetex server
//!
//! Usage:
//!   kuwetex-client report            - Print the usage history
//!   kuwetex-client clean             - Force a cleaning
//!   kuwetex-client recommendations   - Print the recommendations

use clap::Parser;
use cli::commands::RequestCommand;
use shared::ServerConfig;

#[derive(Parser)]
#[command(name = "kuwetex-client")]
#[command(about = "Kuwetex - Smart litter box client")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    command: RequestCommand,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::init_logging();

    let cli = Cli::parse();
    let address = ServerConfig::default().address();

    let answer = cli.command.run(&address).await?;
    println!("{}", console::style(cli.command.request.kind()).cyan().bold());
    println!("{}", answer);
    Ok(())
}

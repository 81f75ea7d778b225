//! kuwetex-server command

use clap::Args;
use kuwetex_core::KuwetexCore;
use shared::KuwetexConfig;
use tracing::info;

#[derive(Debug, Args)]
pub struct ServeCommand {}

impl ServeCommand {
    /// Run the simulation and the server until Ctrl-C
    pub async fn run(&self, config: KuwetexConfig) -> anyhow::Result<()> {
        let core = KuwetexCore::new(config);
        let running = core.start().await?;
        println!(
            "{} listening on {}",
            console::style("Kuwetex").green().bold(),
            running.local_addr()
        );

        tokio::signal::ctrl_c().await?;
        info!("Ctrl-C received");
        running.shutdown().await?;
        Ok(())
    }
}

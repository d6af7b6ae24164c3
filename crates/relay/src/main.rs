//! Relay CLI binary.
//!
//! - `run` connects to Discord (requires the `discord` feature)
//! - `chat` talks to the pipeline from the terminal
//! - `init-config` writes an example configuration

use clap::Parser;
use relay::{RelayConfig, init_telemetry};

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands, run_chat, run_relay};

    let cli = Cli::parse();

    if let Commands::InitConfig { path } = &cli.command {
        RelayConfig::write_example(path)?;
        println!("Wrote example configuration to {}", path.display());
        return Ok(());
    }

    let mut config = RelayConfig::load(cli.config.as_deref())?;
    if cli.verbose {
        let logging = config.logging().clone().with_level("debug");
        config = config.with_logging(logging);
    }
    init_telemetry(config.logging())?;

    match cli.command {
        Commands::Run => run_relay(config).await?,
        Commands::Chat { channel } => run_chat(config, &channel).await?,
        Commands::InitConfig { .. } => {}
    }

    Ok(())
}

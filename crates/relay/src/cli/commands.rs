//! CLI command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Relay - Discord chat relay for an OpenWebUI completion endpoint
#[derive(Parser, Debug)]
#[command(name = "relay")]
#[command(about = "Discord chat relay for an OpenWebUI completion endpoint", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file; defaults to ./relay.toml when present
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Connect to Discord and relay messages until interrupted
    Run,

    /// Chat with the relay from the terminal
    Chat {
        /// Channel name the conversation is kept under
        #[arg(long, default_value = "console")]
        channel: String,
    },

    /// Write an example configuration file
    InitConfig {
        /// Destination path
        path: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_with_global_flags() {
        let cli = Cli::parse_from(["relay", "chat", "--channel", "lobby", "-v", "--config", "r.toml"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("r.toml")));
        assert!(matches!(cli.command, Commands::Chat { channel } if channel == "lobby"));
    }

    #[test]
    fn test_parse_init_config() {
        let cli = Cli::parse_from(["relay", "init-config", "out/relay.toml"]);
        assert!(matches!(cli.command, Commands::InitConfig { path } if path == PathBuf::from("out/relay.toml")));
    }
}

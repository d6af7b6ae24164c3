//! The `chat` command.

use relay::{ConsoleTransport, RelayApp, RelayConfig, Shutdown, relay_lines};
use relay_error::RelayResult;
use tokio::io::BufReader;
use tracing::info;

/// Relay terminal input as mentions in one channel.
pub async fn run_chat(config: RelayConfig, channel: &str) -> RelayResult<()> {
    config.validate_without_discord()?;
    let shutdown = Shutdown::default();
    let app = RelayApp::build(&config, shutdown.token())?;
    let transport = ConsoleTransport::stdout();
    let author = std::env::var("USER").unwrap_or_else(|_| "console".to_string());

    info!(channel, "Console chat started. Type a message, or CTRL+D to quit.");
    let input = BufReader::new(tokio::io::stdin());
    tokio::select! {
        result = relay_lines(app.handler(), &transport, input, channel, &author, shutdown.token()) => {
            let relayed = result?;
            info!(relayed, "End of input");
        }
        _ = shutdown.wait_for_signal() => {}
    }

    shutdown.shutdown().await;
    app.shutdown().await;
    Ok(())
}

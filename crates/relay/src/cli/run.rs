//! The `run` command.

use relay::RelayConfig;
use relay_error::RelayResult;

/// Run the Discord relay until a signal arrives.
#[cfg(feature = "discord")]
pub async fn run_relay(config: RelayConfig) -> RelayResult<()> {
    use relay::{RelayApp, Shutdown};
    use relay_error::TransportError;
    use relay_social::DiscordRelay;
    use tracing::{error, info};

    config.validate()?;
    let mut shutdown = Shutdown::default();
    let app = RelayApp::build(&config, shutdown.token())?;

    let discord = DiscordRelay::new(config.discord().clone(), app.handler().clone())
        .await
        .map_err(TransportError::from)?;
    let token = shutdown.token().clone();
    shutdown.spawn(async move {
        if let Err(e) = discord.run(token.clone()).await {
            error!(error = %e, "Discord relay stopped");
            token.cancel();
        }
    });

    info!("Relay running. Press CTRL+C to shutdown.");
    shutdown.wait_for_signal().await;
    shutdown.shutdown().await;
    app.shutdown().await;
    Ok(())
}

/// Without the `discord` feature there is no gateway to run.
#[cfg(not(feature = "discord"))]
pub async fn run_relay(config: RelayConfig) -> RelayResult<()> {
    use relay_error::ConfigError;

    config.validate()?;
    Err(ConfigError::new("relay was built without the `discord` feature; use `chat` instead").into())
}

//! Lichess bot
//!
//! Accepts challenges and plays every game it is in, one session task per
//! game, with the move strategy chosen in the environment.

use std::sync::Arc;

use lichess_bot::config::BotConfig;
use lichess_bot::dispatcher::Dispatcher;
use lichess_bot::lichess::LichessClient;
use lichess_bot::transport::Transport;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = BotConfig::load()?;
    let transport: Arc<dyn Transport> = Arc::new(LichessClient::new(&config)?);

    let mut dispatcher =
        Dispatcher::new(transport, config.strategy.clone(), config.accept_challenges).await?;

    tokio::select! {
        result = dispatcher.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("Received Ctrl-C, shutting down"),
    }

    Ok(())
}

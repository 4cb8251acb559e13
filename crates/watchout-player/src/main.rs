//! WatchOut player binary
//!
//! Usage: `watchout-player <id> [port]`

use watchout_player::{run, PlayerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "watchout_player=info,watchout_protocols=info,watchout_sync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = PlayerConfig::from_env()?;
    tracing::info!("Starting player {}", config.id);

    run(config).await?;
    Ok(())
}

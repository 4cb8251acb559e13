//! WatchOut registry binary

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use watchout_registry::{run, RegistryConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "watchout_registry=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting WatchOut registry");

    let config = RegistryConfig::from_env()?;
    run(config).await?;

    Ok(())
}

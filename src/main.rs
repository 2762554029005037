use anyhow::Context;
use poem::listener::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use forum::{AppState, build_app, config::Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load().context("loading configuration")?;
    let state = AppState::from_config(&config)
        .await
        .context("connecting to the database")?;

    info!(addr = %config.bind_addr, "forum listening");
    poem::Server::new(TcpListener::bind(config.bind_addr))
        .run(build_app(state))
        .await?;
    Ok(())
}

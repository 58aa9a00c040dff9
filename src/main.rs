use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use tracing::info;
use vidnest::{configs::Config, server::AppState, transport};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Config::load()?;

    let default_level = config.logging.level.clone().unwrap_or_else(|| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_timer(tracing_subscriber::fmt::time::LocalTime::rfc_3339())
        .init();

    let state = Arc::new(AppState::new(config.clone())?);
    let app = transport::http_server::router(state);

    let host: IpAddr = config.server.host.parse()?;
    let address = SocketAddr::new(host, config.server.port);
    info!("vidnest API listening on {}", address);

    let listener = tokio::net::TcpListener::bind(address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

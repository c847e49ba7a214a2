use anyhow::{Context, Result};
use chargedeck::{Config, Dashboard, logging};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    logging::init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("ChargeDeck {} starting up", env!("APP_VERSION"));

    let host = config.web.host.clone();
    let port = config.web.port;
    let dashboard = Dashboard::bootstrap(config)
        .map_err(|e| anyhow::anyhow!("Failed to start dashboard: {}", e))?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for ctrl-c: {}", e);
        }
        info!("Shutdown requested");
    };

    let served = chargedeck::web::serve(dashboard.state(), &host, port, shutdown).await;
    dashboard.shutdown().await;
    if let Err(e) = &served {
        error!("Web server error: {}", e);
    }
    Ok(served?)
}

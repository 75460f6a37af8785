//! Capex Trail API Server
//!
//! Accepts analysis requests, runs them as background jobs and serves their
//! results and live narration.

use capex_trail::config::AppConfig;
use capex_trail::core::http::start_server;
use capex_trail::logging;
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env if present
    dotenv().ok();

    logging::init_logging();

    let config = AppConfig::from_env()?;
    info!("Starting Capex Trail API Server");
    info!(environment = %config.environment, "Environment");
    info!(port = config.port, "HTTP Server: http://0.0.0.0:{}", config.port);
    info!(
        persistent = config.database_url.is_some(),
        market_data = config.market_data_url.is_some(),
        reasoning = config.reasoning.is_some(),
        "Collaborators"
    );

    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(config).await {
            error!(error = %e, "HTTP server error");
        }
    });

    info!("API server started, waiting for shutdown signal...");
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Shutting down API server...");
            info!("In-flight analyses are abandoned and will be marked failed on next start");
        }
        _ = server_handle => {
            error!("HTTP server stopped");
        }
    }

    Ok(())
}

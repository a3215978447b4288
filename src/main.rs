//! clock-probe server entry point.
//!
//! Usage: `clock-probe [port]`.

use tracing_subscriber::EnvFilter;

use clock_probe::config::ServerConfig;
use clock_probe::server::ProbeServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json_logs = std::env::var("PROBE_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    // Load configuration
    let config = ServerConfig::load(std::env::args().skip(1))?;
    tracing::info!(addr = %config.listen_addr(), "starting clock-probe");

    // Start server
    let server = ProbeServer::bind(&config).await?;
    server.run().await?;

    Ok(())
}

//! Campaign Survey Server: campaign questionnaires, response statistics and
//! raffle draws over a REST API.
//!
//! Main entry point that loads configuration and starts the server.

mod server;

use campaign_core::config::AppConfig;
use clap::Parser;
use server::ApiServer;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "campaign-survey-server")]
#[command(about = "Campaign surveys, statistics and raffle draws")]
#[command(version)]
struct Cli {
    /// Node identifier (overrides config)
    #[arg(long, env = "CAMPAIGN_SURVEY__NODE_ID")]
    node_id: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "CAMPAIGN_SURVEY__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Metrics port (overrides config)
    #[arg(long, env = "CAMPAIGN_SURVEY__METRICS__PORT")]
    metrics_port: Option<u16>,

    /// Spin reel length for draw animations (overrides config)
    #[arg(long, env = "CAMPAIGN_SURVEY__RAFFLE__REEL_LENGTH")]
    reel_length: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "campaign_survey_server=info,campaign_management=info,tower_http=info".into()
            }),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("Campaign Survey Server starting up");

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    if let Some(node_id) = cli.node_id {
        config.node_id = node_id;
    }
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(port) = cli.metrics_port {
        config.metrics.port = port;
    }
    if let Some(reel_length) = cli.reel_length {
        config.raffle.reel_length = reel_length;
    }

    info!(
        node_id = %config.node_id,
        http_port = config.api.http_port,
        metrics_port = config.metrics.port,
        "Configuration loaded"
    );

    let api_server = ApiServer::new(config);

    if let Err(e) = api_server.start_metrics() {
        error!(error = %e, "Failed to start metrics exporter");
    }

    info!("Campaign Survey Server is ready to serve traffic");

    api_server.start_http().await?;

    Ok(())
}

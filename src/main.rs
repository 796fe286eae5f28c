mod agent;
mod constants;
mod error;
mod formatters;
mod models;
mod moon;
mod rpc;
mod service;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent::{AgentRegistry, SunriseAgent};
use rpc::AppState;
use service::{SunService, SunTimesShape};

#[derive(Parser)]
#[command(author, version, about = "Sunrise, sunset, and moon phase agent gateway")]
struct Cli {
    /// Address to bind the HTTP server to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind the HTTP server to
    #[arg(long, default_value_t = 4111)]
    port: u16,

    /// Response shape to request from the astronomy upstream
    #[arg(long, value_enum, default_value = "local-with-timezone")]
    sun_times_shape: SunTimesShape,

    /// Timeout for each upstream call, in seconds (single attempt, no retry)
    #[arg(long, default_value_t = 10)]
    upstream_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sunrise_agent_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    tracing::info!("Starting sunrise agent gateway");

    let service = SunService::new(
        Duration::from_secs(cli.upstream_timeout_secs),
        cli.sun_times_shape,
    )?;

    let mut registry = AgentRegistry::new();
    registry.register("sunriseAgent", Arc::new(SunriseAgent::new(service)));

    let state = AppState {
        registry: Arc::new(registry),
    };
    let app = rpc::router(state);

    let address = format!("{}:{}", cli.host, cli.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    tracing::info!("Listening on http://{address}");
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use echofinder_embed::api::{ApiContext, ApiServer};
use echofinder_embed::config::{Config, DEFAULT_CONFIG_PATH};
use echofinder_embed::model::ModelHolder;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Sentence embedding and similarity service.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Listen address, overrides `server.host`
    #[arg(long)]
    host: Option<String>,

    /// Listen port, overrides `server.port`
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    info!("Starting echofinder-embed...");

    // 1. Load config
    let mut config = Config::load(&args.config)?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.validate().context("invalid configuration")?;
    let addr = config.listen_addr()?;
    let config = Arc::new(config);

    // 2. Load model (blocking: may download files and builds the ONNX session)
    let model_config = config.model.clone();
    let compute_config = config.compute.clone();
    let model = match tokio::task::spawn_blocking(move || {
        ModelHolder::load(&model_config, &compute_config)
    })
    .await
    {
        Ok(holder) => holder,
        Err(e) => {
            error!("✗ Model loader crashed: {e}");
            ModelHolder::unavailable(&config.model.name)
        }
    };
    if !model.is_ready() {
        error!("Running in degraded mode: every request will report that the model is not loaded");
    }

    // 3. Serve
    let ctx = ApiContext {
        model: Arc::new(model),
        config,
    };
    ApiServer::new(ctx).start(addr).await
}

//! Prospecting server.
//!
//! Exposes the geospatial prospect search over HTTP for the CRM front-end.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use prospect::{Config, DataSource, ProspectPipeline};

mod handlers;
use handlers::{router, AppState};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "prospect-server")]
#[command(about = "Geospatial business prospecting server")]
struct Args {
    /// Listen address (overrides the config file)
    #[arg(short, long)]
    listen: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Sirene API key; without one, searches return the demo dataset
    #[arg(long, env = "SIRENE_API_KEY", hide_env_values = true)]
    registry_api_key: Option<String>,

    /// Skip the website presence probe
    #[arg(long)]
    no_probe: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("prospect=info,prospect_server=info,tower_http=info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(listen) = args.listen {
        config.server.listen = listen;
    }
    if args.registry_api_key.is_some() {
        config.registry.api_key = args.registry_api_key;
    }
    if args.no_probe {
        config.probe.enabled = false;
    }

    info!("Prospect server");
    info!("Geocoder: {}", config.geocoder.endpoint);
    info!("Registry: {}", config.registry.base_url);

    let pipeline = ProspectPipeline::from_config(&config)?;
    if pipeline.registry_mode() == DataSource::Synthetic {
        warn!("No registry API key configured, searches will return synthetic data");
    }

    let state = Arc::new(AppState { pipeline });
    let app = router(state);

    info!("Starting server on {}", config.server.listen);

    let listener = tokio::net::TcpListener::bind(&config.server.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.listen))?;
    axum::serve(listener, app).await?;

    Ok(())
}

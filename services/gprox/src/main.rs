//! GPROX Server
//!
//! Provisions ACME DNS-01 challenge TXT records in Google Cloud DNS.
//!
//! # Usage
//! ```bash
//! # Serve with the default config path (/etc/gprox/config.yaml)
//! gprox
//!
//! # Explicit config and listen address
//! gprox --config ./config.yaml --listen 127.0.0.1:9000
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use gprox::api::{router, AppState};
use gprox::config::{load_settings, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
use gprox::google::ClientCache;
use gprox::manager::{ChangerSource, DnsManager};
use gprox::metrics::DnsMetrics;

#[derive(Parser, Debug)]
#[command(name = "gprox")]
#[command(about = "ACME DNS-01 TXT record proxy for Google Cloud DNS", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, env = CONFIG_PATH_ENV, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Address to listen on
    #[arg(long, env = "GPROX_LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    listen: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = load_settings(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    // RUST_LOG overrides the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_directive().unwrap_or("info")));

    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .json()
        .init();

    info!("Starting GPROX v{}", env!("CARGO_PKG_VERSION"));
    info!(
        zones = settings.managed_zones.len(),
        api_keys = settings.api_keys.len(),
        "Configuration loaded from {}",
        cli.config.display()
    );
    for warning in settings.warnings() {
        warn!("{}", warning);
    }

    let settings = Arc::new(settings);
    let metrics = DnsMetrics::new()?;

    // Credentials are checked once before serving
    let clients: Arc<ClientCache> = Arc::new(ClientCache::default());
    clients
        .get_or_build(&settings)
        .await
        .context("Failed to initialize Google Cloud DNS client")?;

    let changers: Arc<dyn ChangerSource> = clients;
    let manager = Arc::new(DnsManager::new(settings.clone(), changers, metrics.clone()));

    let app = router(AppState {
        settings,
        manager,
        metrics,
    });

    let listener = tokio::net::TcpListener::bind(cli.listen)
        .await
        .with_context(|| format!("Failed to bind {}", cli.listen))?;
    info!("GPROX listening on {}", cli.listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("GPROX stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

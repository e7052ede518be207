mod api;

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use skycast_core::{CitySearch, Config, Dataset, FailoverResolver};
use tracing_subscriber::EnvFilter;

use crate::api::{AppState, build_app};

/// HTTP API for weather lookups with provider failover.
#[derive(Debug, Parser)]
#[command(name = "skycast-server", version)]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "SKYCAST_BIND", default_value = "127.0.0.1:8080")]
    bind: SocketAddr,

    /// Config file; defaults to the platform config directory.
    #[arg(long, env = "SKYCAST_CONFIG")]
    config: Option<PathBuf>,

    /// Overrides `[data] dataset_dir`.
    #[arg(long, env = "SKYCAST_DATASET_DIR")]
    dataset_dir: Option<PathBuf>,

    /// Overrides `[data] snapshot_path`.
    #[arg(long, env = "SKYCAST_SNAPSHOT")]
    snapshot: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, env = "SKYCAST_LOG", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&args.log_level))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = load_config(&args)?;
    let dataset = Arc::new(Dataset::from_config(&config.data)?);

    let resolver = FailoverResolver::from_config(&config, Arc::clone(&dataset));
    tracing::info!(sources = ?resolver.sources(), "failover chain ready");

    let search = CitySearch::from_config(&config, dataset);
    // Build the place index before accepting traffic.
    let index = search.index();
    tracing::info!(records = index.len(), remote_search = search.has_remote(), "city search ready");

    let app = build_app(AppState { resolver: Arc::new(resolver), search: Arc::new(search) });

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;
    tracing::info!(addr = %args.bind, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.apply_env_overrides();

    if let Some(dir) = &args.dataset_dir {
        config.data.dataset_dir = Some(dir.clone());
    }
    if let Some(path) = &args.snapshot {
        config.data.snapshot_path = Some(path.clone());
    }

    Ok(config)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use registry_proxy::config::loader;
use registry_proxy::config::watcher::ConfigWatcher;
use registry_proxy::config::ActiveConfig;
use registry_proxy::lifecycle::signals::forward_signals;
use registry_proxy::observability::{init_logging, metrics};
use registry_proxy::{HttpServer, Shutdown};

/// Transparent reverse proxy for container registries.
#[derive(Parser, Debug)]
#[command(name = "registry-proxy", version, about)]
struct Cli {
    /// Optional TOML configuration file; watched for changes.
    #[arg(short, long, env = "PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Listen port on all interfaces. Overrides `PORT` and the config file.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = loader::load(cli.config.as_deref(), |k| std::env::var(k).ok())?;
    if let Some(port) = cli.port {
        config.listener.bind_address = format!("0.0.0.0:{port}");
    }

    init_logging(&config.observability)?;

    tracing::info!("registry-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.hostname,
        config_file = ?cli.config,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let bind_address = config.listener.bind_address.clone();
    let shared = ActiveConfig::compile(config)?.into_shared();

    // Must outlive the server for reloads to keep flowing.
    let _watcher = match &cli.config {
        Some(path) => Some(ConfigWatcher::new(path, shared.clone()).run()?),
        None => None,
    };

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    let server_shutdown = shutdown.subscribe();
    forward_signals(shutdown.clone());

    let server = HttpServer::with_shared(shared)?;
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

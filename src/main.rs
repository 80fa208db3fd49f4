//! Dispatch gateway CLI entry point.
//!
//! Binds the HTTP dispatch surface to one handler module, configured via
//! flags or a TOML file.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use edge_dispatch_common::{ConfigFile, ModuleConfig};
use edge_dispatch_server::{EdgeServer, ModuleSource, ServerConfig};

#[derive(Debug, Parser)]
#[command(name = "edge-dispatch", about = "Single-module edge dispatch gateway")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to bind (overrides the config file).
    #[arg(long, env = "BIND_ADDR")]
    bind: Option<SocketAddr>,

    /// Path to the handler module (overrides the config file).
    #[arg(long)]
    module: Option<PathBuf>,

    /// Entry function exported by the handler module.
    #[arg(long)]
    entry: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,edge_dispatch=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting edge-dispatch");

    let args = Args::parse();

    // Load configuration file if given
    let config_file = match &args.config {
        Some(path) => ConfigFile::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ConfigFile::default(),
    };

    // Resolve the handler module: CLI flag wins over the config file
    let module = match (&args.module, config_file.module) {
        (Some(path), file_module) => ModuleConfig {
            path: path.display().to_string(),
            entry: args
                .entry
                .clone()
                .or(file_module.map(|m| m.entry))
                .unwrap_or_else(|| "handle".to_string()),
        },
        (None, Some(mut file_module)) => {
            if let Some(entry) = args.entry.clone() {
                file_module.entry = entry;
            }
            file_module
        }
        (None, None) => anyhow::bail!(
            "No handler module configured. Pass --module <path> or add a [module] section"
        ),
    };

    let bind_addr: SocketAddr = match args.bind {
        Some(addr) => addr,
        None => config_file
            .server
            .bind_addr
            .parse()
            .context("Invalid bind_addr in config. Expected 'host:port' (e.g., '0.0.0.0:8080')")?,
    };

    let server_config = ServerConfig {
        bind_addr,
        request_timeout_secs: config_file.server.request_timeout_secs,
        graceful_shutdown: config_file.server.graceful_shutdown,
    };

    info!(
        bind_addr = %bind_addr,
        module = %module.path,
        entry = %module.entry,
        "Configuration loaded"
    );

    let server = EdgeServer::new(
        &config_file.runtime,
        server_config,
        ModuleSource::File(module.path.into()),
        &module.entry,
    )?;

    info!("Server initialized. Available endpoints:");
    info!("  GET  /health   - Health check");
    info!("  GET  /ready    - Readiness check");
    info!("  ANY  /*        - Dispatch to the handler module");

    server.run().await?;

    Ok(())
}

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use codelab_server::{
    app::{build_router, shutdown_signal},
    config::{CliOverrides, FileConfig, ServerConfig},
    workspace::WorkspaceStore,
};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "codelab-server", version, about = "Workspace file server for the CodeLab IDE")]
struct Cli {
    /// Interface to bind (overrides CODELAB_HOST).
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides PORT).
    #[arg(long)]
    port: Option<u16>,

    /// Initial workspace root (overrides CODELAB_WORKSPACE_DIR).
    #[arg(long)]
    workspace: Option<PathBuf>,

    /// Config file to load instead of ~/.codelab/config.toml.
    #[arg(long, env = "CODELAB_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // The subscriber isn't up yet, so a broken config file is reported after init.
    let (file_config, config_error) = match FileConfig::discover(cli.config.as_deref()) {
        Ok(file_config) => (file_config, None),
        Err(error) => (FileConfig::default(), Some(error)),
    };

    let config = ServerConfig::from_env(file_config).with_overrides(CliOverrides {
        host: cli.host,
        port: cli.port,
        workspace_dir: cli.workspace,
    });

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .init();

    if let Some(error) = config_error {
        warn!(%error, "ignoring config file");
    }

    let store = WorkspaceStore::open(&config.workspace_dir).await.with_context(|| {
        format!("failed to prepare workspace directory {}", config.workspace_dir.display())
    })?;
    let app = build_router(store, config.cors_origins.as_deref());

    let addrs = config.listen_addrs().await.context("invalid listen address")?;
    let listener = TcpListener::bind(&addrs[..])
        .await
        .with_context(|| format!("failed to bind listener on {}:{}", config.host, config.port))?;
    let listen_addr = listener.local_addr().context("listener has no local address")?;

    info!(listen_addr = %listen_addr, "starting codelab server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("codelab server exited unexpectedly")
}

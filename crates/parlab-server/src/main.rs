//! parlab server
//!
//! HTTP/WebSocket front end for compiling and running parallel C/C++
//! programs: batch submission over `/compile`, interactive sessions over
//! `/ws`, plus the toolchain probe and example catalog.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use parlab::Config;
use tracing::{Level, debug, info};
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

mod http;
mod state;
mod ws;

#[derive(Parser)]
#[command(name = "parlab-server")]
#[command(about = "Compile-and-run service for parallel C/C++ programs")]
#[command(version)]
struct Cli {
    /// Port to listen on
    #[arg(short, long, default_value = "8000")]
    port: u16,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = if let Some(ref path) = cli.config {
        info!(?path, "loading configuration");
        Config::from_file(path).context("failed to load configuration")?
    } else {
        debug!("using default configuration");
        Config::default()
    };

    let workspace_root = config.workspace_root();
    tokio::fs::create_dir_all(&workspace_root)
        .await
        .with_context(|| format!("failed to create workspace root {workspace_root:?}"))?;

    let state = AppState::new(config.clone());

    // Sweep stale workspaces left behind by crash/leak paths. Live jobs
    // remove their own directory; this is the backstop.
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(config.sweep_interval());
        loop {
            interval.tick().await;
            let removed = parlab::sweep_stale(&workspace_root, config.stale_after()).await;
            if removed > 0 {
                info!(removed, "swept stale workspaces");
            }
        }
    });

    let app = http::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .await
        .context("server terminated")?;

    Ok(())
}

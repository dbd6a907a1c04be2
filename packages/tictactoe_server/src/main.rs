use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;

use tictactoe_server::config::{CliOverrides, FileConfig, ServerConfig, load_config};
use tictactoe_server::{AppState, serve};

#[derive(Parser)]
#[command(name = "tictactoe")]
#[command(about = "Authoritative two-player tic-tac-toe over WebSocket")]
struct Cli {
    /// TOML config file (TTT_* env vars still apply on top)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to
    #[arg(short = 'b', long)]
    host: Option<String>,

    /// Port for the web server (0 = auto-select)
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let default_directive = if cli.debug {
        "tictactoe=debug,tictactoe_server=debug,tower_http=debug,info"
    } else {
        "tictactoe=info,tictactoe_server=info,tower_http=info,warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter)
        .init();

    let file_config: FileConfig = load_config(cli.config.as_deref())
        .extract()
        .context("Failed to load configuration")?;
    let overrides = CliOverrides {
        host: cli.host,
        port: cli.port,
    };
    let config = ServerConfig::from_file(&file_config, &overrides)?;

    info!(
        "Config: disconnect_policy={:?}, announce_mover={}, outbound_buffer={}",
        config.disconnect_policy, config.announce_mover, config.outbound_buffer
    );
    if !config.announce_mover {
        warn!("announce_mover is off: Move broadcasts omit the mover's symbol");
    }

    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr()))?;
    let actual_addr = listener.local_addr()?;

    info!("Tic-tac-toe listening on http://{}", actual_addr);
    info!("  GET /ws        - Game WebSocket");
    info!("  GET /sessions  - Live sessions");
    info!("  GET /health    - Health check");

    // Create shutdown signal handler
    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    serve(listener, AppState::new(config), shutdown_signal).await?;

    info!("Shutdown complete");
    Ok(())
}

mod cli;
mod error;
mod routes;
mod shutdown;
mod state;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use leaderboard_core::{ScoreStore, SnapshotFile};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::Args;
use crate::shutdown::ShutdownSignal;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("leaderboard=info".parse()?))
        .init();

    let args = Args::parse();

    info!("Leaderboard starting...");

    let store = ScoreStore::open(SnapshotFile::new(&args.scores_file));
    info!(
        "Loaded {} existing scores from {}",
        store.len(),
        args.scores_file.display()
    );
    let state = AppState::new(store);

    let addr = args.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Leaderboard server running on port {}", args.port);
    info!("Leaderboard API at http://{}/leaderboard", addr);

    let shutdown = Arc::new(ShutdownSignal::new());
    shutdown.listen_for_os_signals();

    routes::serve(listener, state, shutdown).await?;

    info!("Leaderboard stopped");
    Ok(())
}

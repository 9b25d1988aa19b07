use axum::routing::get;
use axum::{Router, Json};
use clap::Parser;
use shard_mine::app_state::AppState;
use shard_mine::clock::{Clock, SystemClock};
use shard_mine::config::ServerConfig;
use shard_mine::gateway::ws_handler;
use shard_mine::metrics;
use shard_mine::persistence::memory::InMemoryPersistenceStore;
use shard_mine::persistence::sled_store::SledPersistenceStore;
use shard_mine::persistence::PersistenceStore;
use shard_mine::reconnection::ReconnectionManager;
use shard_mine::shard_manager::ShardManager;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "shard-mine", about = "Authoritative server for a sharded multiplayer mining game")]
struct Cli {
    /// TCP port to listen on. Overrides SHARD_MINE_PORT.
    #[arg(long)]
    port: Option<u16>,

    /// Path to a sled database directory. If unset, player/chunk state
    /// is kept in memory only and lost on restart.
    #[arg(long)]
    db_path: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))).init();
    metrics::init();

    let cli = Cli::parse();
    let mut config = ServerConfig::from_env();
    if let Some(port) = cli.port {
        config.port = port;
    }

    let persistence: Arc<dyn PersistenceStore> = match &cli.db_path {
        Some(path) => Arc::new(SledPersistenceStore::open(std::path::Path::new(path))?),
        None => {
            tracing::warn!("no --db-path given, running with in-memory persistence only");
            Arc::new(InMemoryPersistenceStore::new())
        }
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let shard_manager = Arc::new(ShardManager::new(clock.clone(), config.max_players_per_shard));
    let reconnection = Arc::new(ReconnectionManager::new(clock.clone(), config.reconnect_grace_ms));
    ReconnectionManager::spawn_sweeper(reconnection.clone(), shard_manager.clone(), config.reconnect_sweep_interval_ms);

    let port = config.port;
    let state = Arc::new(AppState::new(config, clock, shard_manager, reconnection, persistence));

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics_handler))
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "shard-mine listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn metrics_handler() -> String {
    metrics::render()
}

//! Shared application state handed to every axum route (spec.md §4
//! overview). Grounded in the teacher's `AppState`: a thin `Arc`-wrapped
//! bag of already-concurrent-safe handles, no locking at this layer.

use crate::clock::Clock;
use crate::config::ServerConfig;
use crate::persistence::PersistenceStore;
use crate::reconnection::ReconnectionManager;
use crate::shard_manager::ShardManager;
use std::sync::Arc;

pub struct AppState {
    pub config: ServerConfig,
    pub clock: Arc<dyn Clock>,
    pub shard_manager: Arc<ShardManager>,
    pub reconnection: Arc<ReconnectionManager>,
    pub persistence: Arc<dyn PersistenceStore>,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        clock: Arc<dyn Clock>,
        shard_manager: Arc<ShardManager>,
        reconnection: Arc<ReconnectionManager>,
        persistence: Arc<dyn PersistenceStore>,
    ) -> Self {
        Self { config, clock, shard_manager, reconnection, persistence }
    }
}

//! Server configuration.
//!
//! Loaded from environment variables with documented defaults, in the
//! shape of the teacher's `NetworkConfig`/`WalletConfig`: a plain serde
//! struct with a `Default` impl and an `from_env` constructor, no
//! external config-file format required to boot.

use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// TCP port the gateway listens on. Overridden by `--port`.
    pub port: u16,

    /// Max players per shard.
    pub max_players_per_shard: usize,

    /// Per-shard bounded command queue capacity (spec.md §5 backpressure).
    pub command_queue_capacity: usize,

    /// Grace period (ms) a disconnected player's seat is reserved.
    pub disconnect_grace_ms: u64,

    /// Reconnection session TTL (ms), spec.md §4.11.
    pub reconnect_grace_ms: u64,

    /// Periodic reconnection-session sweep interval (ms).
    pub reconnect_sweep_interval_ms: u64,

    /// HMAC signing secret for auth tokens. If unset at startup, an
    /// ephemeral random secret is generated (development convenience,
    /// spec.md §6) and a warning is logged.
    #[serde(skip)]
    pub auth_secret: Vec<u8>,
}

const DEFAULT_PORT: u16 = 7777;
const DEFAULT_MAX_PLAYERS_PER_SHARD: usize = 8;
const DEFAULT_QUEUE_CAPACITY: usize = 512;
const DEFAULT_DISCONNECT_GRACE_MS: u64 = 30_000;
const DEFAULT_RECONNECT_GRACE_MS: u64 = 30_000;
const DEFAULT_RECONNECT_SWEEP_MS: u64 = 10_000;

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_players_per_shard: DEFAULT_MAX_PLAYERS_PER_SHARD,
            command_queue_capacity: DEFAULT_QUEUE_CAPACITY,
            disconnect_grace_ms: DEFAULT_DISCONNECT_GRACE_MS,
            reconnect_grace_ms: DEFAULT_RECONNECT_GRACE_MS,
            reconnect_sweep_interval_ms: DEFAULT_RECONNECT_SWEEP_MS,
            auth_secret: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Builds config from environment, falling back to defaults.
    /// `--port` on the CLI (see `main.rs`) wins over `SHARD_MINE_PORT`.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = env::var("SHARD_MINE_PORT") {
            if let Ok(p) = v.parse() {
                cfg.port = p;
            }
        }
        if let Ok(v) = env::var("SHARD_MINE_MAX_PLAYERS") {
            if let Ok(p) = v.parse() {
                cfg.max_players_per_shard = p;
            }
        }
        if let Ok(v) = env::var("SHARD_MINE_QUEUE_CAPACITY") {
            if let Ok(p) = v.parse() {
                cfg.command_queue_capacity = p;
            }
        }

        cfg.auth_secret = match env::var("SHARD_MINE_AUTH_SECRET") {
            Ok(s) if !s.is_empty() => s.into_bytes(),
            _ => {
                tracing::warn!("SHARD_MINE_AUTH_SECRET not set, generating ephemeral secret (dev only)");
                ephemeral_secret()
            }
        };

        cfg
    }
}

fn ephemeral_secret() -> Vec<u8> {
    use rand::RngCore;
    let mut buf = vec![0u8; 32];
    rand::thread_rng().fill_bytes(&mut buf);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.max_players_per_shard, 8);
    }
}

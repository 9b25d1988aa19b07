//! Persistence backends (spec.md §6 "persisted state layout").
//!
//! Kept behind a trait so the default in-memory backend (tests, local
//! dev) and the `sled`-backed one (spec.md ambient durability) share
//! one call surface. Both are synchronous — `sled` itself is
//! synchronous, and the in-memory map trivially is — so the Shard
//! calls through `tokio::task::spawn_blocking` when persisting from
//! its async tick loop.

pub mod memory;
pub mod sled_store;

use crate::player::{Equipment, PlayerId};
use crate::world::chunk::BlockModification;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedCheckpoint {
    pub shard_id: String,
    pub depth: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedInventoryLine {
    pub slot_index: usize,
    pub item_type: crate::domain::loot::ItemType,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedPlayer {
    pub id: PlayerId,
    pub display_name: String,
    pub gold: u64,
    pub equipment: Equipment,
    pub inventory_slots: usize,
    pub inventory_level: u8,
    pub max_depth_reached: i64,
    pub total_blocks_mined: u64,
    pub total_gold_earned: u64,
    pub total_explosions: u64,
    pub inventory: Vec<PersistedInventoryLine>,
    pub checkpoints: Vec<PersistedCheckpoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedChunk {
    pub world_seed: u32,
    pub chunk_y: i64,
    pub modifications: Vec<BlockModification>,
}

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("backend I/O failure: {0}")]
    Io(String),
    #[error("serialization failure: {0}")]
    Serialization(String),
}

pub trait PersistenceStore: Send + Sync {
    fn save_player(&self, player: &PersistedPlayer) -> Result<(), PersistenceError>;
    fn load_player(&self, id: &PlayerId) -> Result<Option<PersistedPlayer>, PersistenceError>;

    fn save_chunk(&self, chunk: &PersistedChunk) -> Result<(), PersistenceError>;
    fn load_chunk(&self, world_seed: u32, chunk_y: i64) -> Result<Option<PersistedChunk>, PersistenceError>;
}

//! Default in-memory backend. Fine for local dev and tests; nothing
//! survives process restart.

use super::{PersistedChunk, PersistedPlayer, PersistenceError, PersistenceStore};
use crate::player::PlayerId;
use dashmap::DashMap;

#[derive(Default)]
pub struct InMemoryPersistenceStore {
    players: DashMap<PlayerId, PersistedPlayer>,
    chunks: DashMap<(u32, i64), PersistedChunk>,
}

impl InMemoryPersistenceStore {
    pub fn new() -> Self {
        Self { players: DashMap::new(), chunks: DashMap::new() }
    }
}

impl PersistenceStore for InMemoryPersistenceStore {
    fn save_player(&self, player: &PersistedPlayer) -> Result<(), PersistenceError> {
        self.players.insert(player.id.clone(), player.clone());
        Ok(())
    }

    fn load_player(&self, id: &PlayerId) -> Result<Option<PersistedPlayer>, PersistenceError> {
        Ok(self.players.get(id).map(|entry| entry.value().clone()))
    }

    fn save_chunk(&self, chunk: &PersistedChunk) -> Result<(), PersistenceError> {
        self.chunks.insert((chunk.world_seed, chunk.chunk_y), chunk.clone());
        Ok(())
    }

    fn load_chunk(&self, world_seed: u32, chunk_y: i64) -> Result<Option<PersistedChunk>, PersistenceError> {
        Ok(self.chunks.get(&(world_seed, chunk_y)).map(|entry| entry.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Equipment;

    fn sample_player() -> PersistedPlayer {
        PersistedPlayer {
            id: "p1".into(),
            display_name: "Guest".into(),
            gold: 0,
            equipment: Equipment::starting(),
            inventory_slots: 8,
            inventory_level: 0,
            max_depth_reached: 0,
            total_blocks_mined: 0,
            total_gold_earned: 0,
            total_explosions: 0,
            inventory: Vec::new(),
            checkpoints: Vec::new(),
        }
    }

    #[test]
    fn round_trips_a_player() {
        let store = InMemoryPersistenceStore::new();
        store.save_player(&sample_player()).unwrap();
        let loaded = store.load_player(&"p1".to_string()).unwrap().unwrap();
        assert_eq!(loaded.id, "p1");
    }

    #[test]
    fn missing_player_returns_none() {
        let store = InMemoryPersistenceStore::new();
        assert!(store.load_player(&"ghost".to_string()).unwrap().is_none());
    }
}

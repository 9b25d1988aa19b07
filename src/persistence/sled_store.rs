//! `sled`-backed persistence: a production-shaped embedded store.
//! Players and chunks live in separate trees keyed by a flat byte
//! encoding of their identity.

use super::{PersistedChunk, PersistedPlayer, PersistenceError, PersistenceStore};
use crate::player::PlayerId;

pub struct SledPersistenceStore {
    players: sled::Tree,
    chunks: sled::Tree,
}

impl SledPersistenceStore {
    pub fn open(path: &std::path::Path) -> Result<Self, PersistenceError> {
        let db = sled::open(path).map_err(|e| PersistenceError::Io(e.to_string()))?;
        let players = db.open_tree("players").map_err(|e| PersistenceError::Io(e.to_string()))?;
        let chunks = db.open_tree("chunks").map_err(|e| PersistenceError::Io(e.to_string()))?;
        Ok(Self { players, chunks })
    }

    fn chunk_key(world_seed: u32, chunk_y: i64) -> [u8; 12] {
        let mut key = [0u8; 12];
        key[0..4].copy_from_slice(&world_seed.to_be_bytes());
        key[4..12].copy_from_slice(&chunk_y.to_be_bytes());
        key
    }
}

impl PersistenceStore for SledPersistenceStore {
    fn save_player(&self, player: &PersistedPlayer) -> Result<(), PersistenceError> {
        let bytes = bincode::serialize(player).map_err(|e| PersistenceError::Serialization(e.to_string()))?;
        self.players.insert(player.id.as_bytes(), bytes).map_err(|e| PersistenceError::Io(e.to_string()))?;
        Ok(())
    }

    fn load_player(&self, id: &PlayerId) -> Result<Option<PersistedPlayer>, PersistenceError> {
        match self.players.get(id.as_bytes()).map_err(|e| PersistenceError::Io(e.to_string()))? {
            Some(bytes) => {
                let player = bincode::deserialize(&bytes).map_err(|e| PersistenceError::Serialization(e.to_string()))?;
                Ok(Some(player))
            }
            None => Ok(None),
        }
    }

    fn save_chunk(&self, chunk: &PersistedChunk) -> Result<(), PersistenceError> {
        let key = Self::chunk_key(chunk.world_seed, chunk.chunk_y);
        let bytes = bincode::serialize(chunk).map_err(|e| PersistenceError::Serialization(e.to_string()))?;
        self.chunks.insert(&key, bytes).map_err(|e| PersistenceError::Io(e.to_string()))?;
        Ok(())
    }

    fn load_chunk(&self, world_seed: u32, chunk_y: i64) -> Result<Option<PersistedChunk>, PersistenceError> {
        let key = Self::chunk_key(world_seed, chunk_y);
        match self.chunks.get(&key).map_err(|e| PersistenceError::Io(e.to_string()))? {
            Some(bytes) => {
                let chunk = bincode::deserialize(&bytes).map_err(|e| PersistenceError::Serialization(e.to_string()))?;
                Ok(Some(chunk))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Equipment;

    fn sample_player(id: &str) -> PersistedPlayer {
        PersistedPlayer {
            id: id.to_string(),
            display_name: "Guest".into(),
            gold: 42,
            equipment: Equipment::starting(),
            inventory_slots: 8,
            inventory_level: 0,
            max_depth_reached: 10,
            total_blocks_mined: 5,
            total_gold_earned: 42,
            total_explosions: 0,
            inventory: Vec::new(),
            checkpoints: Vec::new(),
        }
    }

    #[test]
    fn round_trips_a_player_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledPersistenceStore::open(dir.path()).unwrap();
        store.save_player(&sample_player("p1")).unwrap();
        let loaded = store.load_player(&"p1".to_string()).unwrap().unwrap();
        assert_eq!(loaded.gold, 42);
    }

    #[test]
    fn round_trips_a_chunk_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledPersistenceStore::open(dir.path()).unwrap();
        let chunk = PersistedChunk { world_seed: 1, chunk_y: 3, modifications: Vec::new() };
        store.save_chunk(&chunk).unwrap();
        let loaded = store.load_chunk(1, 3).unwrap().unwrap();
        assert_eq!(loaded.chunk_y, 3);
    }
}

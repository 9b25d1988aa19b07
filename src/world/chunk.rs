//! Chunk storage and deterministic generation (spec.md §4.2).
//!
//! Design note §9: a chunk is a slab-allocated fixed-size array owned
//! by the `WorldStore`, not a dictionary keyed by coordinate. A
//! `modifications` log sits alongside it so persistence can replay
//! local edits over freshly regenerated terrain without ever copying
//! the grid itself.

use super::block::Block;
use crate::domain::constants::{CHUNK_HEIGHT, CHUNK_WIDTH, SAFE_SPAWN_BLOCKS};
use crate::domain::layers::{layer_for_depth, BlockType};
use crate::rng::{chunk_seed, DeterministicRng};
use serde::{Deserialize, Serialize};

/// A recorded local edit, replayable over fresh generation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BlockModification {
    pub local_x: i64,
    pub local_y: i64,
    pub new_type: BlockType,
    pub new_hp: f64,
}

pub struct ChunkRecord {
    pub chunk_y: i64,
    data: Vec<Block>,
    pub modifications: Vec<BlockModification>,
    pub dirty: bool,
    pub last_accessed: u64,
}

fn index(local_x: i64, local_y: i64) -> usize {
    (local_x * CHUNK_HEIGHT + local_y) as usize
}

impl ChunkRecord {
    /// Generates a chunk from scratch. Bit-exact for the same
    /// `(world_seed, chunk_y)` across processes (spec.md §8).
    pub fn generate(world_seed: u32, chunk_y: i64, now_millis: u64) -> Self {
        let mut rng = DeterministicRng::from_seed(chunk_seed(world_seed, chunk_y));
        let mut data = Vec::with_capacity((CHUNK_WIDTH * CHUNK_HEIGHT) as usize);

        for local_x in 0..CHUNK_WIDTH {
            for local_y in 0..CHUNK_HEIGHT {
                let y = chunk_y * CHUNK_HEIGHT + local_y;
                let layer = layer_for_depth(y);
                let hardness = layer.hardness_at(y);

                // Always draw once per block, unconditionally, so a
                // single-block regeneration and a full-chunk
                // regeneration land on the same value at this index.
                let roll = rng.next_f64();
                let block_type = if y >= SAFE_SPAWN_BLOCKS && roll < layer.tnt_spawn_chance {
                    BlockType::Tnt
                } else {
                    layer.native_block
                };

                data.push(Block { block_type, hp: hardness, max_hp: hardness, x: local_x, y });
            }
        }

        Self { chunk_y, data, modifications: Vec::new(), dirty: false, last_accessed: now_millis }
    }

    pub fn get(&self, local_x: i64, local_y: i64) -> &Block {
        &self.data[index(local_x, local_y)]
    }

    pub fn get_mut(&mut self, local_x: i64, local_y: i64) -> &mut Block {
        &mut self.data[index(local_x, local_y)]
    }

    pub fn iter_non_empty(&self) -> impl Iterator<Item = &Block> {
        self.data.iter().filter(|b| !b.is_empty())
    }

    /// Records and applies one local edit, marking the chunk dirty.
    pub fn apply_modification(&mut self, modification: BlockModification) {
        let block = self.get_mut(modification.local_x, modification.local_y);
        block.block_type = modification.new_type;
        block.hp = modification.new_hp;
        block.max_hp = block.max_hp.max(modification.new_hp);
        self.modifications.push(modification);
        self.dirty = true;
    }

    /// Replays a saved modification log over freshly generated data,
    /// reestablishing the chunk's last-known mutated state (spec.md
    /// §4.2 "applyModifications").
    pub fn replay_modifications(&mut self, modifications: &[BlockModification]) {
        for &m in modifications {
            let block = self.get_mut(m.local_x, m.local_y);
            block.block_type = m.new_type;
            block.hp = m.new_hp;
        }
        self.modifications = modifications.to_vec();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_bit_exact_across_calls() {
        let a = ChunkRecord::generate(12345, 0, 0);
        let b = ChunkRecord::generate(12345, 0, 0);
        for (ba, bb) in a.data.iter().zip(b.data.iter()) {
            assert_eq!(ba.block_type, bb.block_type);
            assert_eq!(ba.hp, bb.hp);
            assert_eq!(ba.max_hp, bb.max_hp);
            assert_eq!((ba.x, ba.y), (bb.x, bb.y));
        }
    }

    #[test]
    fn safe_spawn_column_never_hazards() {
        let chunk = ChunkRecord::generate(999, 0, 0);
        for local_x in 0..CHUNK_WIDTH {
            for local_y in 0..SAFE_SPAWN_BLOCKS {
                assert_ne!(chunk.get(local_x, local_y).block_type, BlockType::Tnt);
            }
        }
    }

    #[test]
    fn replay_reproduces_mutated_state() {
        let mut fresh = ChunkRecord::generate(42, 3, 0);
        let modification = BlockModification { local_x: 5, local_y: 5, new_type: BlockType::Empty, new_hp: 0.0 };
        fresh.apply_modification(modification);

        let mut regenerated = ChunkRecord::generate(42, 3, 0);
        regenerated.replay_modifications(&fresh.modifications);

        assert_eq!(regenerated.get(5, 5).block_type, BlockType::Empty);
        assert_eq!(regenerated.get(5, 5).hp, 0.0);
    }
}

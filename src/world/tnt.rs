//! TNT chain-explosion engine (spec.md §4.3).
//!
//! Operates purely over a caller-supplied read-only snapshot — no
//! WorldStore access, no suspension points, and no side effects. The
//! caller (`DigValidator`) pre-scans a halo of blocks around the
//! initiating coordinate and is responsible for sizing it generously
//! enough to contain the whole cascade.

use crate::domain::layers::{layer_for_depth, BlockType};
use crate::world::block::Block;
use std::collections::{HashMap, HashSet, VecDeque};

pub const TNT_CHAIN_DELAY_MS: u64 = 500;
pub const TNT_LAUNCH_DISTANCE: i64 = 10;
pub const TNT_CHAIN_EXTRA_LAUNCH: i64 = 5;

pub type Coord = (i64, i64);

#[derive(Debug, Clone, serde::Serialize)]
pub struct ExplosionPhase {
    pub center: Coord,
    pub destroyed_blocks: Vec<Coord>,
    pub delay_ms: u64,
}

#[derive(Debug, Clone)]
pub struct ChainResult {
    pub phases: Vec<ExplosionPhase>,
    pub total_blocks_destroyed: Vec<Coord>,
    pub total_gold_penalty: u64,
    pub total_launch_distance: i64,
}

impl ChainResult {
    pub fn chain_length(&self) -> usize {
        self.phases.len()
    }
}

fn neighborhood_3x3(center: Coord) -> impl Iterator<Item = Coord> {
    let (cx, cy) = center;
    (-1..=1).flat_map(move |dx| (-1..=1).map(move |dy| (cx + dx, cy + dy)))
}

/// Runs the cascade starting from `initial`. `lookup` must answer the
/// same coordinate with the same block on every call within one run —
/// callers pass an immutable snapshot, never a live, mutating view.
pub fn run_chain(initial: Coord, lookup: &HashMap<Coord, Block>) -> ChainResult {
    let mut processed: HashSet<Coord> = HashSet::new();
    let mut enqueued: HashSet<Coord> = HashSet::new();
    let mut destroyed: HashSet<Coord> = HashSet::new();
    let mut destroyed_order: Vec<Coord> = Vec::new();
    let mut phases: Vec<ExplosionPhase> = Vec::new();
    let mut gold_penalty: u64 = 0;

    // One BFS level == one set of centers that detonate simultaneously
    // (same delay). Each center still gets its own output entry, since
    // `ExplosionPhase` carries a single `center` plus the blocks that
    // one detonation destroyed.
    let mut current_level: VecDeque<Coord> = VecDeque::new();
    current_level.push_back(initial);
    enqueued.insert(initial);

    let mut k = 0u64;
    while !current_level.is_empty() {
        let mut next_level: Vec<Coord> = Vec::new();

        while let Some(center) = current_level.pop_front() {
            if processed.contains(&center) {
                continue;
            }
            processed.insert(center);

            if let Some(y) = lookup.get(&center).map(|b| b.y) {
                gold_penalty += layer_for_depth(y).tnt_gold_penalty;
            } else {
                gold_penalty += layer_for_depth(center.1.max(0)).tnt_gold_penalty;
            }

            let mut phase_destroyed: Vec<Coord> = Vec::new();
            for coord in neighborhood_3x3(center) {
                if destroyed.insert(coord) {
                    destroyed_order.push(coord);
                }
                phase_destroyed.push(coord);

                let is_hazard = lookup
                    .get(&coord)
                    .map(|b| b.block_type == BlockType::Tnt)
                    .unwrap_or(false);
                if is_hazard && !processed.contains(&coord) && enqueued.insert(coord) {
                    next_level.push(coord);
                }
            }

            phases.push(ExplosionPhase {
                center,
                destroyed_blocks: phase_destroyed,
                delay_ms: k * TNT_CHAIN_DELAY_MS,
            });
        }

        current_level = next_level.into();
        k += 1;
    }

    let chain_length = phases.len() as i64;
    let total_launch_distance =
        TNT_LAUNCH_DISTANCE + (chain_length - 1).max(0) * TNT_CHAIN_EXTRA_LAUNCH;

    ChainResult {
        phases,
        total_blocks_destroyed: destroyed_order,
        total_gold_penalty: gold_penalty,
        total_launch_distance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::layers::BlockType;

    fn block_at(x: i64, y: i64, block_type: BlockType) -> Block {
        Block { block_type, hp: 1.0, max_hp: 1.0, x, y }
    }

    fn snapshot_with_tnt(coords: &[Coord]) -> HashMap<Coord, Block> {
        let mut map = HashMap::new();
        for &(x, y) in coords {
            map.insert((x, y), block_at(x, y, BlockType::Tnt));
        }
        map
    }

    #[test]
    fn single_tnt_destroys_3x3_only() {
        let snapshot = snapshot_with_tnt(&[(50, 100)]);
        let result = run_chain((50, 100), &snapshot);
        assert_eq!(result.chain_length(), 1);
        assert_eq!(result.total_blocks_destroyed.len(), 9);
        assert_eq!(result.total_launch_distance, TNT_LAUNCH_DISTANCE);
    }

    #[test]
    fn scenario_three_chain_of_two() {
        // spec.md §8 scenario 3
        let snapshot = snapshot_with_tnt(&[(50, 100), (51, 100), (50, 102)]);
        let result = run_chain((50, 100), &snapshot);

        assert_eq!(result.chain_length(), 2);
        assert!(result.total_blocks_destroyed.contains(&(51, 100)));
        assert!(result.total_blocks_destroyed.contains(&(50, 101)));
        assert!(result.total_blocks_destroyed.contains(&(52, 101)));
        // (50,102) is dy=2 from (51,100)'s 3x3, so it never ignites.
        assert_eq!(result.phases[0].center, (50, 100));
        assert_eq!(result.phases[1].center, (51, 100));
        assert_eq!(result.total_launch_distance, 10 + 1 * 5);
    }

    #[test]
    fn idempotent_on_same_snapshot() {
        let snapshot = snapshot_with_tnt(&[(0, 10), (1, 10), (2, 10)]);
        let a = run_chain((0, 10), &snapshot);
        let b = run_chain((0, 10), &snapshot);
        assert_eq!(a.total_blocks_destroyed, b.total_blocks_destroyed);
        assert_eq!(a.total_gold_penalty, b.total_gold_penalty);
        assert_eq!(a.chain_length(), b.chain_length());
    }

    #[test]
    fn every_destroyed_coordinate_unique() {
        let snapshot = snapshot_with_tnt(&[(0, 10), (1, 10), (1, 11), (0, 11)]);
        let result = run_chain((0, 10), &snapshot);
        let unique: HashSet<_> = result.total_blocks_destroyed.iter().collect();
        assert_eq!(unique.len(), result.total_blocks_destroyed.len());
    }
}

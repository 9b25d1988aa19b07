//! `DigValidator`: the rules a dig command must pass and the outcomes
//! it can produce, including TNT chains and the random event table
//! (spec.md §4.6).

use crate::domain::constants::{
    CAVE_IN_ITEMS_LOST, CAVE_IN_PUSH_DISTANCE, GAS_POCKET_DURATION_MS, ROCK_SLIDE_DURATION_BLOCKS,
    ROCK_SLIDE_HARDNESS_BONUS, STUN_DURATION_MS,
};
use crate::domain::equipment::{
    helmet_max_depth, shovel_damage, vest_protection_fraction, GAS_IMMUNITY_MIN_TORCH_TIER,
    ROCK_SLIDE_IMMUNITY_MIN_HELMET_TIER,
};
use crate::domain::layers::{layer_below, layer_for_depth, layer_index_for_depth};
use crate::domain::loot::{weighted_pick, ItemType};
use crate::economy::apply_tnt_penalty;
use crate::error::ErrorCode;
use crate::player::PlayerState;
use crate::rng::DeterministicRng;
use crate::world::store::WorldStore;
use crate::world::tnt::{run_chain, Coord, ExplosionPhase};

/// Base trigger chances, in priority order. Positive events are never
/// gated by equipment; the three negative ones are (see `roll_events`).
const TREASURE_CHEST_CHANCE: f64 = 0.008;
const UNDERGROUND_SPRING_CHANCE: f64 = 0.01;
const CAVE_IN_CHANCE: f64 = 0.02;
const GAS_POCKET_CHANCE: f64 = 0.015;
const ROCK_SLIDE_CHANCE: f64 = 0.02;

const TNT_HALO_RADIUS: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigError {
    Stunned,
    NotAdjacent,
    DepthLimit,
    NoBlock,
}

impl From<DigError> for ErrorCode {
    fn from(e: DigError) -> Self {
        match e {
            DigError::Stunned => ErrorCode::Stunned,
            DigError::NotAdjacent => ErrorCode::NotAdjacent,
            DigError::DepthLimit => ErrorCode::DepthLimit,
            DigError::NoBlock => ErrorCode::NoBlock,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExplosionOutcome {
    pub center: Coord,
    pub destroyed_blocks: Vec<Coord>,
    pub chain_tail: Vec<ExplosionPhase>,
    pub gold_penalty: u64,
    pub player_launch_to_y: i64,
}

#[derive(Debug, Clone)]
pub enum TriggeredEvent {
    TreasureChest { drops: Vec<ItemType> },
    UndergroundSpring { drops: Vec<ItemType> },
    CaveIn { items_lost: Vec<ItemType>, pushed_to_y: i64 },
    GasPocket { blanked_until_millis: u64 },
    RockSlide { bonus_hardness: f64, remaining_blocks: u32 },
}

#[derive(Debug, Clone)]
pub struct BlockDestroyedOutcome {
    pub x: i64,
    pub y: i64,
    pub drop: Option<ItemType>,
    pub event: Option<TriggeredEvent>,
}

#[derive(Debug, Clone)]
pub enum DigOutcome {
    Explosion(ExplosionOutcome),
    BlockDestroyed(BlockDestroyedOutcome),
    BlockUpdate { x: i64, y: i64, remaining_hp: f64 },
}

pub struct DigValidator;

impl DigValidator {
    /// Steps 1-3 of spec.md §4.6; does not touch the world.
    pub fn validate(player: &PlayerState, x: i64, y: i64, now_millis: u64) -> Result<(), DigError> {
        if player.is_stunned && player.stun_end_millis > now_millis {
            return Err(DigError::Stunned);
        }
        let dx = (x - player.position.x).abs();
        let dy = (y - player.position.y).abs();
        if dx.max(dy) > 1 {
            return Err(DigError::NotAdjacent);
        }
        if y > helmet_max_depth(player.equipment.helmet) {
            return Err(DigError::DepthLimit);
        }
        Ok(())
    }

    /// Runs the full dig: validation, then either the TNT branch or
    /// the normal damage/loot/event branch. Mutates `world` and
    /// `player` directly on success.
    #[allow(clippy::too_many_arguments)]
    pub fn resolve(
        player: &mut PlayerState,
        world: &mut WorldStore,
        x: i64,
        y: i64,
        now_millis: u64,
        loot_rng: &mut DeterministicRng,
        event_rng: &mut DeterministicRng,
    ) -> Result<DigOutcome, DigError> {
        Self::validate(player, x, y, now_millis)?;

        let block = world.get_block(x, y, now_millis).filter(|b| !b.is_empty()).ok_or(DigError::NoBlock)?;

        if block.block_type.is_hazard() {
            return Ok(DigOutcome::Explosion(Self::resolve_tnt(player, world, x, y, now_millis)));
        }

        Self::resolve_normal(player, world, x, y, now_millis, loot_rng, event_rng)
    }

    fn resolve_tnt(player: &mut PlayerState, world: &mut WorldStore, x: i64, y: i64, now_millis: u64) -> ExplosionOutcome {
        let mut snapshot = std::collections::HashMap::new();
        for dx in -TNT_HALO_RADIUS..=TNT_HALO_RADIUS {
            for dy in -TNT_HALO_RADIUS..=TNT_HALO_RADIUS {
                let (bx, by) = (x + dx, y + dy);
                if let Some(b) = world.get_block(bx, by, now_millis) {
                    snapshot.insert((bx, by), b);
                }
            }
        }

        let chain = run_chain((x, y), &snapshot);
        for &(dx, dy) in &chain.total_blocks_destroyed {
            world.destroy_block(dx, dy, now_millis);
        }

        apply_tnt_penalty(player, chain.total_gold_penalty, now_millis + STUN_DURATION_MS);
        let player_launch_to_y = (player.position.y - chain.total_launch_distance).max(0);

        let chain_tail = chain.phases.iter().skip(1).cloned().collect();

        ExplosionOutcome {
            center: (x, y),
            destroyed_blocks: chain.total_blocks_destroyed,
            chain_tail,
            gold_penalty: chain.total_gold_penalty,
            player_launch_to_y,
        }
    }

    fn resolve_normal(
        player: &mut PlayerState,
        world: &mut WorldStore,
        x: i64,
        y: i64,
        now_millis: u64,
        loot_rng: &mut DeterministicRng,
        event_rng: &mut DeterministicRng,
    ) -> Result<DigOutcome, DigError> {
        let damage = shovel_damage(player.equipment.shovel)
            + if player.rock_slide_blocks_remaining > 0 { ROCK_SLIDE_HARDNESS_BONUS } else { 0.0 };
        let result = world.damage_block(x, y, damage, now_millis).ok_or(DigError::NoBlock)?;

        if player.rock_slide_blocks_remaining > 0 {
            player.rock_slide_blocks_remaining -= 1;
        }

        if !result.destroyed {
            return Ok(DigOutcome::BlockUpdate { x, y, remaining_hp: result.remaining_hp });
        }

        player.total_blocks_mined += 1;
        player.record_depth(y);

        let layer = layer_for_depth(y);
        let drop = if loot_rng.next_f64() < layer.item_drop_chance {
            Some(weighted_pick(layer.loot_table, loot_rng))
        } else {
            None
        };

        let event = Self::roll_events(player, layer, y, now_millis, event_rng);

        Ok(DigOutcome::BlockDestroyed(BlockDestroyedOutcome { x, y, drop, event }))
    }

    fn roll_events(
        player: &mut PlayerState,
        layer: &'static crate::domain::layers::Layer,
        y: i64,
        now_millis: u64,
        event_rng: &mut DeterministicRng,
    ) -> Option<TriggeredEvent> {
        if event_rng.next_f64() < TREASURE_CHEST_CHANCE {
            let mut drops = vec![weighted_pick(layer.loot_table, event_rng)];
            if event_rng.next_f64() < 0.5 {
                if let Some(below) = layer_below(layer_index_for_depth(y)) {
                    drops.push(weighted_pick(below.loot_table, event_rng));
                }
            }
            return Some(TriggeredEvent::TreasureChest { drops });
        }

        if event_rng.next_f64() < UNDERGROUND_SPRING_CHANCE {
            let count = 3 + event_rng.next_below(3); // 3..=5
            let drops = (0..count).map(|_| weighted_pick(layer.loot_table, event_rng)).collect();
            return Some(TriggeredEvent::UndergroundSpring { drops });
        }

        if event_rng.next_f64() < CAVE_IN_CHANCE {
            let protected = event_rng.next_f64() < vest_protection_fraction(player.equipment.vest);
            if !protected {
                let items_lost = player.inventory.remove_random_items(CAVE_IN_ITEMS_LOST, event_rng);
                let pushed_to_y = (player.position.y - CAVE_IN_PUSH_DISTANCE).max(0);
                player.position.y = pushed_to_y;
                return Some(TriggeredEvent::CaveIn { items_lost, pushed_to_y });
            }
        }

        if player.equipment.torch < GAS_IMMUNITY_MIN_TORCH_TIER && event_rng.next_f64() < GAS_POCKET_CHANCE {
            let blanked_until_millis = now_millis + GAS_POCKET_DURATION_MS;
            player.gas_blanked_until_millis = blanked_until_millis;
            return Some(TriggeredEvent::GasPocket { blanked_until_millis });
        }

        if player.equipment.helmet < ROCK_SLIDE_IMMUNITY_MIN_HELMET_TIER && event_rng.next_f64() < ROCK_SLIDE_CHANCE {
            player.rock_slide_blocks_remaining = ROCK_SLIDE_DURATION_BLOCKS;
            return Some(TriggeredEvent::RockSlide {
                bonus_hardness: ROCK_SLIDE_HARDNESS_BONUS,
                remaining_blocks: ROCK_SLIDE_DURATION_BLOCKS,
            });
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{event_stream_seed, loot_stream_seed};
    use crate::world::store::Position;

    fn player_at(x: i64, y: i64) -> PlayerState {
        PlayerState::new("p1".into(), "Guest".into(), Position { x, y })
    }

    #[test]
    fn not_adjacent_rejects_far_target() {
        let player = player_at(10, 5);
        let err = DigValidator::validate(&player, 12, 5, 0).unwrap_err();
        assert_eq!(err, DigError::NotAdjacent);
    }

    #[test]
    fn stunned_rejects_until_timer_elapses() {
        let mut player = player_at(10, 5);
        player.is_stunned = true;
        player.stun_end_millis = 5_000;
        assert_eq!(DigValidator::validate(&player, 10, 6, 1_000), Err(DigError::Stunned));
        assert!(DigValidator::validate(&player, 10, 6, 6_000).is_ok());
    }

    #[test]
    fn depth_limit_rejects_beyond_helmet_rating() {
        let player = player_at(10, 99);
        assert_eq!(DigValidator::validate(&player, 10, 500, 0), Err(DigError::DepthLimit));
    }

    #[test]
    fn digging_dirt_destroys_and_reports_no_block_after() {
        let mut player = player_at(10, 0);
        let mut world = WorldStore::new(12345);
        let mut loot_rng = DeterministicRng::from_seed(loot_stream_seed(12345));
        let mut event_rng = DeterministicRng::from_seed(event_stream_seed(12345));

        let outcome = DigValidator::resolve(&mut player, &mut world, 10, 1, 0, &mut loot_rng, &mut event_rng).unwrap();
        match outcome {
            DigOutcome::BlockDestroyed(d) => assert_eq!((d.x, d.y), (10, 1)),
            other => panic!("expected BlockDestroyed, got {other:?}"),
        }
        assert_eq!(player.total_blocks_mined, 1);

        let err = DigValidator::resolve(&mut player, &mut world, 10, 1, 0, &mut loot_rng, &mut event_rng).unwrap_err();
        assert_eq!(err, DigError::NoBlock);
    }

    #[test]
    fn tnt_chain_applies_penalty_and_stun() {
        let mut world = WorldStore::new(1);
        let mut tnt_coord = None;
        'search: for x in 0..crate::domain::constants::CHUNK_WIDTH {
            for y in 20..crate::domain::constants::CHUNK_HEIGHT {
                if world.get_block(x, y, 0).unwrap().block_type == crate::domain::layers::BlockType::Tnt {
                    tnt_coord = Some((x, y));
                    break 'search;
                }
            }
        }
        let (tx, ty) = tnt_coord.expect("seed 1 chunk 0 must contain at least one tnt block");

        let mut player = player_at(tx, ty - 1);
        let mut loot_rng = DeterministicRng::from_seed(1);
        let mut event_rng = DeterministicRng::from_seed(2);
        let outcome = DigValidator::resolve(&mut player, &mut world, tx, ty, 0, &mut loot_rng, &mut event_rng).unwrap();

        match outcome {
            DigOutcome::Explosion(e) => {
                assert_eq!(e.center, (tx, ty));
                assert!(e.destroyed_blocks.contains(&(tx, ty)));
            }
            other => panic!("expected Explosion, got {other:?}"),
        }
        assert!(player.is_stunned);
        assert_eq!(player.total_explosions, 1);
    }
}

//! Per-player fog-of-war (spec.md §4.4).
//!
//! Wraps `WorldStore::get_revealed_blocks`'s raw geometry primitive
//! with the per-player revealed-set dedup: once a hazard coordinate is
//! revealed to a player it stays revealed for the rest of the session,
//! even if the player walks back out of torch range.

use crate::domain::equipment::torch_radius;
use crate::player::PlayerId;
use crate::world::store::{Position, Reveal, WorldStore};
use std::collections::{HashMap, HashSet};

struct PlayerFogState {
    last_position: Position,
    revealed: HashSet<(i64, i64)>,
}

#[derive(Default)]
pub struct FogOfWar {
    players: HashMap<PlayerId, PlayerFogState>,
}

impl FogOfWar {
    pub fn new() -> Self {
        Self { players: HashMap::new() }
    }

    /// Call on join, respawn, or teleport (checkpoint descend / surface
    /// return): there is no meaningful "old position" to diff against,
    /// so every hazard within radius of `position` is newly revealed.
    pub fn on_player_spawn(
        &mut self,
        player_id: &PlayerId,
        position: Position,
        torch_tier: u8,
        world: &mut WorldStore,
        now: u64,
    ) -> Vec<Reveal> {
        let radius = torch_radius(torch_tier);
        let reveals = world.get_revealed_blocks(position, radius, None, now);
        let state = self
            .players
            .entry(player_id.clone())
            .or_insert_with(|| PlayerFogState { last_position: position, revealed: HashSet::new() });
        state.last_position = position;
        Self::dedup(state, reveals)
    }

    /// Call on every accepted move. Only hazards newly within radius
    /// and not yet in the player's revealed set are returned.
    pub fn on_player_move(
        &mut self,
        player_id: &PlayerId,
        new_position: Position,
        torch_tier: u8,
        world: &mut WorldStore,
        now: u64,
    ) -> Vec<Reveal> {
        let radius = torch_radius(torch_tier);
        let state = self
            .players
            .entry(player_id.clone())
            .or_insert_with(|| PlayerFogState { last_position: new_position, revealed: HashSet::new() });
        let old_position = state.last_position;
        state.last_position = new_position;

        let reveals = world.get_revealed_blocks(new_position, radius, Some(old_position), now);
        Self::dedup(state, reveals)
    }

    fn dedup(state: &mut PlayerFogState, reveals: Vec<Reveal>) -> Vec<Reveal> {
        reveals
            .into_iter()
            .filter(|r| state.revealed.insert((r.x, r.y)))
            .collect()
    }

    pub fn on_player_leave(&mut self, player_id: &PlayerId) {
        self.players.remove(player_id);
    }

    pub fn revealed_count(&self, player_id: &PlayerId) -> usize {
        self.players.get(player_id).map(|s| s.revealed.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(x: i64, y: i64) -> Position {
        Position { x, y }
    }

    #[test]
    fn spawn_reveals_are_idempotent_on_replay() {
        let mut fog = FogOfWar::new();
        let mut world = WorldStore::new(1);
        let id: PlayerId = "p1".into();

        let first = fog.on_player_spawn(&id, pos(10, 10), 3, &mut world, 0);
        let second = fog.on_player_spawn(&id, pos(10, 10), 3, &mut world, 0);

        assert!(!first.is_empty() || first.is_empty());
        assert!(second.is_empty());
    }

    #[test]
    fn revealed_set_only_grows() {
        let mut fog = FogOfWar::new();
        let mut world = WorldStore::new(7);
        let id: PlayerId = "p1".into();

        fog.on_player_spawn(&id, pos(0, 10), 7, &mut world, 0);
        let before = fog.revealed_count(&id);
        fog.on_player_move(&id, pos(1, 10), 7, &mut world, 0);
        let after = fog.revealed_count(&id);

        assert!(after >= before);
    }

    #[test]
    fn moving_back_and_forth_does_not_reduce_revealed_set() {
        let mut fog = FogOfWar::new();
        let mut world = WorldStore::new(3);
        let id: PlayerId = "p1".into();

        fog.on_player_spawn(&id, pos(0, 10), 7, &mut world, 0);
        fog.on_player_move(&id, pos(5, 10), 7, &mut world, 0);
        let peak = fog.revealed_count(&id);
        fog.on_player_move(&id, pos(0, 10), 7, &mut world, 0);
        assert_eq!(fog.revealed_count(&id), peak);
    }

    #[test]
    fn leave_then_rejoin_starts_a_fresh_revealed_set() {
        let mut fog = FogOfWar::new();
        let mut world = WorldStore::new(2);
        let id: PlayerId = "p1".into();

        fog.on_player_spawn(&id, pos(0, 10), 7, &mut world, 0);
        fog.on_player_leave(&id);
        assert_eq!(fog.revealed_count(&id), 0);

        fog.on_player_spawn(&id, pos(0, 10), 7, &mut world, 0);
        assert!(fog.revealed_count(&id) >= 0);
    }
}

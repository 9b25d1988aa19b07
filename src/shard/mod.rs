//! `Shard`: one isolated simulation instance (spec.md §4.8). Owns one
//! `WorldStore`, one `FogOfWar`, the dig rate limiter, and every
//! connected player's authoritative state. All mutation happens on the
//! `GameLoop` task that owns this struct — nothing here is `Sync`
//! shareable by design (spec.md §5 "single-writer-per-shard").

mod handlers;
pub mod game_loop;
pub mod rate_limit;

use crate::domain::constants::{DROP_ITEM_TTL_MS, PLAYER_DISCONNECT_GRACE_MS, SAFE_SPAWN_BLOCKS};
use crate::domain::equipment::torch_radius;
use crate::fog::FogOfWar;
use crate::gateway::protocol::{ClientCommand, PlayerStateView, ServerMessage};
use crate::player::{DropItem, PlayerId, PlayerState};
use crate::rng::{event_stream_seed, loot_stream_seed, DeterministicRng};
use crate::world::store::{Position, WorldStore};
use rate_limit::{ChatRateLimiter, DigRateLimiter};
use std::collections::HashMap;
use tokio::sync::mpsc::UnboundedSender;

pub struct Shard {
    pub id: String,
    pub room_code: Option<String>,
    pub max_players: usize,
    pub world_seed: u32,

    world: WorldStore,
    fog: FogOfWar,
    rate_limiter: DigRateLimiter,
    chat_rate_limiter: ChatRateLimiter,
    loot_rng: DeterministicRng,
    event_rng: DeterministicRng,

    players: HashMap<PlayerId, PlayerState>,
    connections: HashMap<PlayerId, UnboundedSender<ServerMessage>>,
    disconnected_at: HashMap<PlayerId, u64>,
    drops: HashMap<String, DropItem>,
    ever_populated: bool,
}

impl Shard {
    pub fn new(id: String, world_seed: u32, max_players: usize, room_code: Option<String>) -> Self {
        Self {
            id,
            room_code,
            max_players,
            world_seed,
            world: WorldStore::new(world_seed),
            fog: FogOfWar::new(),
            rate_limiter: DigRateLimiter::new(),
            chat_rate_limiter: ChatRateLimiter::new(),
            loot_rng: DeterministicRng::from_seed(loot_stream_seed(world_seed)),
            event_rng: DeterministicRng::from_seed(event_stream_seed(world_seed)),
            players: HashMap::new(),
            connections: HashMap::new(),
            disconnected_at: HashMap::new(),
            drops: HashMap::new(),
            ever_populated: false,
        }
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players
    }

    pub fn is_private(&self) -> bool {
        self.room_code.is_some()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Empty AND has had at least one player join — a freshly spawned
    /// shard with nobody in it yet is not "empty" for shutdown purposes.
    pub fn is_empty(&self) -> bool {
        self.ever_populated && self.players.is_empty()
    }

    fn view_of(&self, player: &PlayerState) -> PlayerStateView {
        PlayerStateView {
            id: player.id.clone(),
            display_name: player.display_name.clone(),
            x: player.position.x,
            y: player.position.y,
            gold: player.gold,
            equipment: player.equipment,
            max_inventory_slots: player.inventory.capacity(player.equipment.vest),
            used_inventory_slots: player.inventory.used_slots(),
            max_depth_reached: player.max_depth_reached,
            is_stunned: player.is_stunned,
        }
    }

    /// Enrolls a player at the safe spawn column, sends the initial
    /// chunk and reveals, and tells peers about the newcomer. Returns
    /// `false` (no mutation) if the shard is full.
    pub fn add_player(
        &mut self,
        connection: UnboundedSender<ServerMessage>,
        mut player: PlayerState,
        now_millis: u64,
    ) -> bool {
        if self.is_full() {
            return false;
        }
        self.ever_populated = true;

        player.position = Position { x: player.position.x, y: SAFE_SPAWN_BLOCKS.min(player.position.y.max(0)) };
        let spawn = player.position;
        let torch_tier = player.equipment.torch;
        let id = player.id.clone();

        self.connections.insert(id.clone(), connection);

        let chunk = self.world.get_chunk_for_client(0, spawn, torch_radius(torch_tier), now_millis);
        self.deliver(&id, vec![ServerMessage::WorldChunk { chunk_y: chunk.chunk_y, blocks: chunk.blocks }]);

        let reveals = self.fog.on_player_spawn(&id, spawn, torch_tier, &mut self.world, now_millis);
        let reveal_msgs = reveals
            .into_iter()
            .map(|r| ServerMessage::RevealBlock { x: r.x, y: r.y, block_type: r.block_type, hp: r.hp, max_hp: r.max_hp })
            .collect();
        self.deliver(&id, reveal_msgs);

        self.broadcast_except(&id, vec![ServerMessage::OtherPlayerJoined {
            player_id: id.clone(),
            display_name: player.display_name.clone(),
            x: spawn.x,
            y: spawn.y,
        }]);

        self.players.insert(id, player);
        true
    }

    pub fn remove_player(&mut self, player_id: &PlayerId) {
        self.players.remove(player_id);
        self.connections.remove(player_id);
        self.disconnected_at.remove(player_id);
        self.rate_limiter.remove_player(player_id);
        self.chat_rate_limiter.remove_player(player_id);
        self.fog.on_player_leave(player_id);
        self.broadcast_except(player_id, vec![ServerMessage::OtherPlayerLeft { player_id: player_id.clone() }]);
    }

    pub fn on_player_disconnect(&mut self, player_id: &PlayerId, now_millis: u64) {
        self.connections.remove(player_id);
        self.disconnected_at.insert(player_id.clone(), now_millis);
    }

    /// Rebinds a reconnecting player's connection. Peers are not
    /// notified — spec.md §4.8: "the player never truly left".
    pub fn on_player_reconnect(&mut self, player_id: &PlayerId, connection: UnboundedSender<ServerMessage>) -> bool {
        if !self.players.contains_key(player_id) {
            return false;
        }
        self.disconnected_at.remove(player_id);
        self.connections.insert(player_id.clone(), connection);
        true
    }

    pub fn handle_command(&mut self, player_id: &PlayerId, command: ClientCommand, now_millis: u64) -> (Vec<ServerMessage>, Vec<ServerMessage>) {
        handlers::dispatch(self, player_id, command, now_millis)
    }

    /// Per-tick hook (spec.md §4.7): grace expiry, stun timers, drop
    /// cleanup. Rock-slide counters are ticked per destroyed block in
    /// `DigValidator`, not per wall-clock tick.
    pub fn tick_hook(&mut self, now_millis: u64) {
        let expired: Vec<PlayerId> = self
            .disconnected_at
            .iter()
            .filter(|&(_, &at)| now_millis.saturating_sub(at) >= PLAYER_DISCONNECT_GRACE_MS)
            .map(|(id, _)| id.clone())
            .collect();
        for id in expired {
            self.remove_player(&id);
        }

        for player in self.players.values_mut() {
            if player.is_stunned && player.stun_end_millis <= now_millis {
                player.is_stunned = false;
            }
        }

        self.drops.retain(|_, drop| !drop.is_expired(now_millis, DROP_ITEM_TTL_MS));
    }

    pub(crate) fn deliver(&self, player_id: &PlayerId, messages: Vec<ServerMessage>) {
        if let Some(tx) = self.connections.get(player_id) {
            for msg in messages {
                let _ = tx.send(msg);
            }
        }
    }

    pub(crate) fn broadcast_except(&self, except: &PlayerId, messages: Vec<ServerMessage>) {
        for (id, tx) in &self.connections {
            if id == except {
                continue;
            }
            for msg in &messages {
                let _ = tx.send(msg.clone());
            }
        }
    }

    pub(crate) fn try_admit_dig(&mut self, player_id: &PlayerId, now_millis: u64) -> bool {
        self.rate_limiter.try_admit(player_id, now_millis)
    }

    pub(crate) fn try_admit_chat(&mut self, player_id: &PlayerId, now_millis: u64) -> bool {
        self.chat_rate_limiter.try_admit(player_id, now_millis)
    }

    /// Materializes a collectible drop at `position` (spec.md §3
    /// "DropItem" lifecycle: created on a non-null loot roll, collected
    /// by the first successful `collect_item`, or swept after
    /// `DROP_ITEM_TTL_MS`).
    pub(crate) fn spawn_drop(&mut self, item_type: crate::domain::loot::ItemType, position: Position, now_millis: u64) {
        let id = uuid::Uuid::new_v4().to_string();
        self.drops.insert(id.clone(), DropItem { id, item_type, position, collected_by: None, spawned_at_millis: now_millis });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    fn sample_player(id: &str) -> PlayerState {
        PlayerState::new(id.to_string(), format!("Guest-{id}"), Position { x: 0, y: 0 })
    }

    #[test]
    fn add_player_fails_when_full() {
        let mut shard = Shard::new("s1".into(), 1, 1, None);
        let (tx1, _rx1) = unbounded_channel();
        let (tx2, _rx2) = unbounded_channel();
        assert!(shard.add_player(tx1, sample_player("a"), 0));
        assert!(!shard.add_player(tx2, sample_player("b"), 0));
    }

    #[test]
    fn disconnect_then_reconnect_within_grace_rebinds() {
        let mut shard = Shard::new("s1".into(), 1, 8, None);
        let (tx, _rx) = unbounded_channel();
        shard.add_player(tx, sample_player("a"), 0);

        shard.on_player_disconnect(&"a".to_string(), 0);
        shard.tick_hook(1_000);
        assert!(shard.players.contains_key("a"));

        let (tx2, _rx2) = unbounded_channel();
        assert!(shard.on_player_reconnect(&"a".to_string(), tx2));
    }

    #[test]
    fn disconnect_past_grace_removes_player() {
        let mut shard = Shard::new("s1".into(), 1, 8, None);
        let (tx, _rx) = unbounded_channel();
        shard.add_player(tx, sample_player("a"), 0);

        shard.on_player_disconnect(&"a".to_string(), 0);
        shard.tick_hook(PLAYER_DISCONNECT_GRACE_MS + 1);
        assert!(!shard.players.contains_key("a"));
    }

    #[test]
    fn spawned_drop_is_collectible() {
        let mut shard = Shard::new("s1".into(), 1, 8, None);
        let (tx, _rx) = unbounded_channel();
        shard.add_player(tx, sample_player("a"), 0);

        shard.spawn_drop(crate::domain::loot::ItemType::GoldOre, Position { x: 1, y: 1 }, 0);
        let item_id = shard.drops.keys().next().cloned().expect("drop was inserted");

        let (own, _broadcast) = handlers::dispatch(
            &mut shard,
            &"a".to_string(),
            ClientCommand::CollectItem { seq: 1, item_id: item_id.clone() },
            0,
        );
        match &own[0] {
            ServerMessage::CollectResult { success, item_id: id, item_type } => {
                assert!(success);
                assert_eq!(id, &item_id);
                assert_eq!(*item_type, Some(crate::domain::loot::ItemType::GoldOre));
            }
            other => panic!("expected CollectResult, got {other:?}"),
        }
        assert!(!shard.drops.contains_key(&item_id));
    }

    #[test]
    fn duplicate_sell_lines_are_checked_against_a_running_total() {
        let mut shard = Shard::new("s1".into(), 1, 8, None);
        let (tx, _rx) = unbounded_channel();
        shard.add_player(tx, sample_player("a"), 0);
        {
            let player = shard.players.get_mut("a").unwrap();
            player.inventory.add(crate::domain::loot::ItemType::GoldOre, 3, player.equipment.vest);
        }

        let items = vec![
            crate::gateway::protocol::SellLine { item_type: crate::domain::loot::ItemType::GoldOre, quantity: 2 },
            crate::gateway::protocol::SellLine { item_type: crate::domain::loot::ItemType::GoldOre, quantity: 2 },
        ];
        let (own, _broadcast) = handlers::dispatch(&mut shard, &"a".to_string(), ClientCommand::Sell { items }, 0);

        assert!(matches!(&own[0], ServerMessage::Error { .. }));
        let player = shard.players.get("a").unwrap();
        assert_eq!(player.inventory.quantity_of(crate::domain::loot::ItemType::GoldOre), 3);
        assert_eq!(player.gold, 0);
    }

    #[test]
    fn buy_equipment_reports_gold_spent() {
        let mut shard = Shard::new("s1".into(), 1, 8, None);
        let (tx, _rx) = unbounded_channel();
        shard.add_player(tx, sample_player("a"), 0);
        shard.players.get_mut("a").unwrap().gold = 50;

        let (own, _broadcast) = handlers::dispatch(
            &mut shard,
            &"a".to_string(),
            ClientCommand::BuyEquipment { slot: crate::domain::equipment::EquipmentSlot::Shovel, tier: 2 },
            0,
        );
        match &own[0] {
            ServerMessage::BuyResult { success, gold_spent, .. } => {
                assert!(success);
                assert_eq!(*gold_spent, Some(50));
            }
            other => panic!("expected BuyResult, got {other:?}"),
        }
    }

    #[test]
    fn chat_limiter_rejects_once_capacity_is_exhausted() {
        let mut shard = Shard::new("s1".into(), 1, 8, None);
        let (tx, _rx) = unbounded_channel();
        shard.add_player(tx, sample_player("a"), 0);

        let id = "a".to_string();
        for _ in 0..crate::domain::constants::CHAT_RATE_LIMIT_PER_SEC {
            assert!(shard.try_admit_chat(&id, 0));
        }
        assert!(!shard.try_admit_chat(&id, 0));
    }
}

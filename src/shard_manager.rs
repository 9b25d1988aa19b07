//! `ShardManager`: shard lifecycle, quick-play selection, and private
//! room codes (spec.md §4.9).

use crate::clock::Clock;
use crate::domain::constants::{ROOM_CODE_ALPHABET, ROOM_CODE_LENGTH};
use crate::gateway::protocol::ServerMessage;
use crate::player::{PlayerId, PlayerState};
use crate::shard::game_loop::{GameLoop, LifecycleEvent, ShardCommand};
use crate::shard::Shard;
use rand::Rng;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::sync::RwLock;

struct ShardHandle {
    command_tx: UnboundedSender<ShardCommand>,
    lifecycle_tx: UnboundedSender<LifecycleEvent>,
    max_players: usize,
    room_code: Option<String>,
    player_count: Arc<AtomicU64>,
}

pub struct CreateShardOptions {
    pub max_players: usize,
    pub private: bool,
}

pub struct ShardManager {
    shards: RwLock<HashMap<String, ShardHandle>>,
    rooms_by_code: RwLock<HashMap<String, String>>,
    player_shard: RwLock<HashMap<PlayerId, String>>,
    clock: Arc<dyn Clock>,
    next_id: AtomicU64,
    default_max_players: usize,
}

impl ShardManager {
    pub fn new(clock: Arc<dyn Clock>, default_max_players: usize) -> Self {
        Self {
            shards: RwLock::new(HashMap::new()),
            rooms_by_code: RwLock::new(HashMap::new()),
            player_shard: RwLock::new(HashMap::new()),
            clock,
            next_id: AtomicU64::new(1),
            default_max_players,
        }
    }

    fn new_shard_id(&self) -> String {
        format!("shard-{}", self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn generate_room_code(&self) -> String {
        let mut rng = rand::thread_rng();
        let alphabet: Vec<char> = ROOM_CODE_ALPHABET.chars().collect();
        (0..ROOM_CODE_LENGTH).map(|_| alphabet[rng.gen_range(0..alphabet.len())]).collect()
    }

    /// Allocates a shard, starts its `GameLoop` as a background task,
    /// and returns its id plus its room code (`Some` only if private).
    pub async fn create_shard(&self, opts: CreateShardOptions) -> (String, Option<String>) {
        let id = self.new_shard_id();
        let world_seed = rand::thread_rng().gen::<u32>();
        let room_code = if opts.private { Some(self.generate_room_code()) } else { None };
        let max_players = opts.max_players.max(1);

        let shard = Shard::new(id.clone(), world_seed, max_players, room_code.clone());
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (lifecycle_tx, lifecycle_rx) = mpsc::unbounded_channel();
        let game_loop = GameLoop::new(shard, command_rx, lifecycle_rx, self.clock.clone());
        tokio::spawn(game_loop.run());

        let handle = ShardHandle {
            command_tx,
            lifecycle_tx,
            max_players,
            room_code: room_code.clone(),
            player_count: Arc::new(AtomicU64::new(0)),
        };

        self.shards.write().await.insert(id.clone(), handle);
        if let Some(code) = &room_code {
            self.rooms_by_code.write().await.insert(code.clone(), id.clone());
        }
        (id, room_code)
    }

    pub async fn destroy_shard(&self, shard_id: &str) {
        let mut shards = self.shards.write().await;
        if let Some(handle) = shards.remove(shard_id) {
            if let Some(code) = handle.room_code {
                self.rooms_by_code.write().await.remove(&code);
            }
        }
        let mut player_shard = self.player_shard.write().await;
        player_shard.retain(|_, sid| sid != shard_id);
    }

    /// Scores every active, non-full, public shard and returns the
    /// best candidate's id, creating a fresh one if none qualifies.
    pub async fn find_or_create_quick_play_shard(&self) -> String {
        let shards = self.shards.read().await;
        let mut best: Option<(String, u32)> = None;
        for (id, handle) in shards.iter() {
            if handle.room_code.is_some() {
                continue;
            }
            let count = handle.player_count.load(Ordering::Relaxed) as usize;
            if count >= handle.max_players {
                continue;
            }
            let score = match count {
                0 => 1,
                1..=2 => 5,
                3..=6 => 10,
                _ => 1,
            };
            if best.as_ref().map_or(true, |(_, best_score)| score > *best_score) {
                best = Some((id.clone(), score));
            }
        }
        drop(shards);

        match best {
            Some((id, _)) => id,
            None => self.create_shard(CreateShardOptions { max_players: self.default_max_players, private: false }).await.0,
        }
    }

    pub async fn find_shard_by_room_code(&self, room_code: &str) -> Option<String> {
        self.rooms_by_code.read().await.get(room_code).cloned()
    }

    pub async fn enqueue_command(&self, shard_id: &str, player_id: PlayerId, command: crate::gateway::protocol::ClientCommand) -> bool {
        let shards = self.shards.read().await;
        match shards.get(shard_id) {
            Some(handle) => handle.command_tx.send(ShardCommand { player_id, command }).is_ok(),
            None => false,
        }
    }

    /// Forwards a `Join` lifecycle event to the shard's `GameLoop` and
    /// records the player→shard binding used for later command routing.
    pub async fn join_shard(&self, shard_id: &str, player: PlayerState, connection: UnboundedSender<ServerMessage>) -> bool {
        let player_id = player.id.clone();
        let sent = {
            let shards = self.shards.read().await;
            match shards.get(shard_id) {
                Some(handle) => handle.lifecycle_tx.send(LifecycleEvent::Join { player, connection }).is_ok(),
                None => false,
            }
        };
        if sent {
            self.bind_player(player_id, shard_id.to_string()).await;
        }
        sent
    }

    pub async fn disconnect_player(&self, shard_id: &str, player_id: PlayerId) {
        let shards = self.shards.read().await;
        if let Some(handle) = shards.get(shard_id) {
            let _ = handle.lifecycle_tx.send(LifecycleEvent::Disconnect { player_id });
        }
    }

    pub async fn reconnect_player(&self, shard_id: &str, player_id: PlayerId, connection: UnboundedSender<ServerMessage>) -> bool {
        let shards = self.shards.read().await;
        match shards.get(shard_id) {
            Some(handle) => handle.lifecycle_tx.send(LifecycleEvent::Reconnect { player_id, connection }).is_ok(),
            None => false,
        }
    }

    async fn bind_player(&self, player_id: PlayerId, shard_id: String) {
        if let Some(handle) = self.shards.read().await.get(&shard_id) {
            handle.player_count.fetch_add(1, Ordering::Relaxed);
        }
        self.player_shard.write().await.insert(player_id, shard_id);
    }

    pub async fn unbind_player(&self, player_id: &PlayerId) {
        if let Some(shard_id) = self.player_shard.write().await.remove(player_id) {
            if let Some(handle) = self.shards.read().await.get(&shard_id) {
                handle.player_count.fetch_sub(1, Ordering::Relaxed);
            }
        }
    }

    pub async fn shard_of(&self, player_id: &PlayerId) -> Option<String> {
        self.player_shard.read().await.get(player_id).cloned()
    }

    pub async fn active_shard_count(&self) -> usize {
        self.shards.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;

    #[tokio::test]
    async fn create_shard_generates_a_room_code_only_when_private() {
        let manager = ShardManager::new(Arc::new(SystemClock), 8);
        let (public_id, public_code) = manager.create_shard(CreateShardOptions { max_players: 8, private: false }).await;
        let (private_id, private_code) = manager.create_shard(CreateShardOptions { max_players: 4, private: true }).await;

        assert!(public_code.is_none());
        assert!(private_code.is_some());
        assert!(manager.find_shard_by_room_code(&private_code.unwrap()).await.is_some());
        assert_ne!(public_id, private_id);
    }

    #[tokio::test]
    async fn quick_play_creates_a_shard_when_none_available() {
        let manager = ShardManager::new(Arc::new(SystemClock), 8);
        let id = manager.find_or_create_quick_play_shard().await;
        assert_eq!(manager.active_shard_count().await, 1);
        assert!(!id.is_empty());
    }
}

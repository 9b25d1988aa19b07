//! The per-shard tick loop (spec.md §4.7). Races the tick timer
//! against the command queue the way the teacher's `farm/websocket.rs`
//! races a socket read against its command channel, except here the
//! loop drains the whole queue on each tick instead of reacting to one
//! message at a time.

use super::Shard;
use crate::clock::Clock;
use crate::domain::constants::TICK_INTERVAL_MS;
use crate::gateway::protocol::{ClientCommand, ServerMessage};
use crate::metrics;
use crate::player::{PlayerId, PlayerState};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub struct ShardCommand {
    pub player_id: PlayerId,
    pub command: ClientCommand,
}

/// Connection lifecycle events. Kept on a separate channel from game
/// commands so join/disconnect/reconnect never queue behind a burst of
/// digs (spec.md §4.11: reconnection must stay responsive under load).
pub enum LifecycleEvent {
    Join { player: PlayerState, connection: UnboundedSender<ServerMessage> },
    Disconnect { player_id: PlayerId },
    Reconnect { player_id: PlayerId, connection: UnboundedSender<ServerMessage> },
}

pub struct GameLoop {
    shard: Shard,
    command_rx: UnboundedReceiver<ShardCommand>,
    lifecycle_rx: UnboundedReceiver<LifecycleEvent>,
    clock: Arc<dyn Clock>,
}

impl GameLoop {
    pub fn new(
        shard: Shard,
        command_rx: UnboundedReceiver<ShardCommand>,
        lifecycle_rx: UnboundedReceiver<LifecycleEvent>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { shard, command_rx, lifecycle_rx, clock }
    }

    /// Runs until the shard empties out. Intended to be `tokio::spawn`'d
    /// by the `ShardManager`.
    pub async fn run(mut self) {
        let mut interval = tokio::time::interval(Duration::from_millis(TICK_INTERVAL_MS));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            let tick_start = Instant::now();
            let now_millis = self.clock.unix_millis();

            let mut lifecycle = Vec::new();
            while let Ok(event) = self.lifecycle_rx.try_recv() {
                lifecycle.push(event);
            }
            for event in lifecycle {
                match event {
                    LifecycleEvent::Join { player, connection } => {
                        self.shard.add_player(connection, player, now_millis);
                    }
                    LifecycleEvent::Disconnect { player_id } => {
                        self.shard.on_player_disconnect(&player_id, now_millis);
                    }
                    LifecycleEvent::Reconnect { player_id, connection } => {
                        self.shard.on_player_reconnect(&player_id, connection);
                    }
                }
            }

            let mut drained = Vec::new();
            while let Ok(cmd) = self.command_rx.try_recv() {
                drained.push(cmd);
            }

            for cmd in drained {
                if matches!(cmd.command, ClientCommand::Dig { .. }) && !self.shard.try_admit_dig(&cmd.player_id, now_millis) {
                    metrics::DIGS_RATE_LIMITED_TOTAL.inc();
                    self.shard.deliver(&cmd.player_id, vec![ServerMessage::error(crate::error::ErrorCode::RateLimited)]);
                    continue;
                }
                if matches!(cmd.command, ClientCommand::Chat { .. }) && !self.shard.try_admit_chat(&cmd.player_id, now_millis) {
                    self.shard.deliver(&cmd.player_id, vec![ServerMessage::error(crate::error::ErrorCode::ChatRateLimit)]);
                    continue;
                }
                let (own, broadcast) = self.shard.handle_command(&cmd.player_id, cmd.command, now_millis);
                self.shard.deliver(&cmd.player_id, own);
                self.shard.broadcast_except(&cmd.player_id, broadcast);
            }

            self.shard.tick_hook(now_millis);
            metrics::TICKS_TOTAL.inc();

            let elapsed = tick_start.elapsed();
            metrics::TICK_DURATION_SECONDS.observe(elapsed.as_secs_f64());
            if elapsed.as_millis() as u64 > TICK_INTERVAL_MS * 8 / 10 {
                tracing::warn!(shard_id = %self.shard.id, elapsed_ms = elapsed.as_millis() as u64, "tick exceeded 80% of interval");
            }

            if self.shard.is_empty() {
                tracing::info!(shard_id = %self.shard.id, "shard emptied, stopping game loop");
                break;
            }
        }
    }
}

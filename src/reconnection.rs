//! `ReconnectionManager`: tracks disconnected-but-not-yet-expired
//! sessions and periodically sweeps the ones that time out (spec.md
//! §4.11). The grace period itself is also enforced inside `Shard::tick_hook`
//! — this manager's sweep is the Gateway-side mirror that frees the
//! player→shard routing table and tells the `ShardManager` the seat is
//! gone for good once the session has expired everywhere.

use crate::clock::Clock;
use crate::player::PlayerId;
use crate::shard_manager::ShardManager;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct Session {
    display_name: String,
    shard_id: String,
    disconnected_at_millis: u64,
}

pub struct ReconnectionManager {
    sessions: Mutex<HashMap<PlayerId, Session>>,
    clock: Arc<dyn Clock>,
    grace_ms: u64,
}

impl ReconnectionManager {
    pub fn new(clock: Arc<dyn Clock>, grace_ms: u64) -> Self {
        Self { sessions: Mutex::new(HashMap::new()), clock, grace_ms }
    }

    pub async fn on_disconnect(&self, player_id: PlayerId, display_name: String, shard_id: String) {
        let now = self.clock.unix_millis();
        self.sessions.lock().await.insert(player_id, Session { display_name, shard_id, disconnected_at_millis: now });
    }

    /// Returns the shard id to rebind into if `player_id` has a
    /// still-valid disconnected session, clearing the session either way.
    pub async fn on_reconnect(&self, player_id: &PlayerId) -> Option<String> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.remove(player_id)?;
        let now = self.clock.unix_millis();
        if now.saturating_sub(session.disconnected_at_millis) > self.grace_ms {
            return None;
        }
        Some(session.shard_id)
    }

    pub async fn display_name_of(&self, player_id: &PlayerId) -> Option<String> {
        self.sessions.lock().await.get(player_id).map(|s| s.display_name.clone())
    }

    /// Drops sessions past grace and unbinds them from their shard's
    /// routing table. Intended to run on `reconnect_sweep_interval_ms`.
    pub async fn sweep_expired(&self, shard_manager: &ShardManager) {
        let now = self.clock.unix_millis();
        let expired: Vec<(PlayerId, String)> = {
            let mut sessions = self.sessions.lock().await;
            let expired_ids: Vec<PlayerId> = sessions
                .iter()
                .filter(|(_, s)| now.saturating_sub(s.disconnected_at_millis) > self.grace_ms)
                .map(|(id, _)| id.clone())
                .collect();
            expired_ids
                .into_iter()
                .filter_map(|id| sessions.remove(&id).map(|s| (id, s.shard_id)))
                .collect()
        };
        for (player_id, _shard_id) in expired {
            shard_manager.unbind_player(&player_id).await;
        }
    }

    /// Runs `sweep_expired` on a fixed interval until the returned
    /// handle is dropped or aborted.
    pub fn spawn_sweeper(manager: Arc<Self>, shard_manager: Arc<ShardManager>, interval_ms: u64) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_millis(interval_ms));
            loop {
                interval.tick().await;
                manager.sweep_expired(&shard_manager).await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;

    #[tokio::test]
    async fn reconnect_within_grace_returns_the_shard() {
        let clock = FakeClock::new(0);
        let manager = ReconnectionManager::new(Arc::new(clock.clone()), 30_000);
        manager.on_disconnect("p1".to_string(), "Rusty".to_string(), "shard-1".to_string()).await;

        clock.advance(std::time::Duration::from_millis(5_000));
        let shard_id = manager.on_reconnect(&"p1".to_string()).await;
        assert_eq!(shard_id, Some("shard-1".to_string()));
    }

    #[tokio::test]
    async fn reconnect_past_grace_returns_none() {
        let clock = FakeClock::new(0);
        let manager = ReconnectionManager::new(Arc::new(clock.clone()), 30_000);
        manager.on_disconnect("p1".to_string(), "Rusty".to_string(), "shard-1".to_string()).await;

        clock.advance(std::time::Duration::from_millis(30_001));
        let shard_id = manager.on_reconnect(&"p1".to_string()).await;
        assert_eq!(shard_id, None);
    }

    #[tokio::test]
    async fn reconnect_consumes_the_session() {
        let clock = FakeClock::new(0);
        let manager = ReconnectionManager::new(Arc::new(clock.clone()), 30_000);
        manager.on_disconnect("p1".to_string(), "Rusty".to_string(), "shard-1".to_string()).await;

        assert!(manager.on_reconnect(&"p1".to_string()).await.is_some());
        assert!(manager.on_reconnect(&"p1".to_string()).await.is_none());
    }
}

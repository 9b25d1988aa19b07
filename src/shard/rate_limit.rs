//! Per-player rate limiting: rolling 1-second windows for digs
//! (`MAX_DIG_RATE_PER_SEC`, spec.md §4.7) and chat
//! (`CHAT_RATE_LIMIT_PER_SEC`, SPEC_FULL.md §4.13).

use crate::domain::constants::{CHAT_RATE_LIMIT_PER_SEC, MAX_DIG_RATE_PER_SEC};
use crate::player::PlayerId;
use std::collections::{HashMap, VecDeque};

const WINDOW_MS: u64 = 1_000;

#[derive(Default)]
struct SlidingWindow {
    windows: HashMap<PlayerId, VecDeque<u64>>,
}

impl SlidingWindow {
    fn new() -> Self {
        Self { windows: HashMap::new() }
    }

    fn try_admit(&mut self, player_id: &PlayerId, now_millis: u64, capacity: u32) -> bool {
        let window = self.windows.entry(player_id.clone()).or_default();
        while let Some(&front) = window.front() {
            if now_millis.saturating_sub(front) >= WINDOW_MS {
                window.pop_front();
            } else {
                break;
            }
        }
        if window.len() as u32 >= capacity {
            return false;
        }
        window.push_back(now_millis);
        true
    }

    fn remove_player(&mut self, player_id: &PlayerId) {
        self.windows.remove(player_id);
    }
}

#[derive(Default)]
pub struct DigRateLimiter(SlidingWindow);

impl DigRateLimiter {
    pub fn new() -> Self {
        Self(SlidingWindow::new())
    }

    /// Records an attempted dig at `now_millis` and returns whether it
    /// is admitted. Rejected attempts are not counted against future
    /// windows.
    pub fn try_admit(&mut self, player_id: &PlayerId, now_millis: u64) -> bool {
        self.0.try_admit(player_id, now_millis, MAX_DIG_RATE_PER_SEC)
    }

    pub fn remove_player(&mut self, player_id: &PlayerId) {
        self.0.remove_player(player_id);
    }
}

#[derive(Default)]
pub struct ChatRateLimiter(SlidingWindow);

impl ChatRateLimiter {
    pub fn new() -> Self {
        Self(SlidingWindow::new())
    }

    pub fn try_admit(&mut self, player_id: &PlayerId, now_millis: u64) -> bool {
        self.0.try_admit(player_id, now_millis, CHAT_RATE_LIMIT_PER_SEC)
    }

    pub fn remove_player(&mut self, player_id: &PlayerId) {
        self.0.remove_player(player_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_up_to_limit_within_window() {
        let mut limiter = DigRateLimiter::new();
        let id: PlayerId = "p1".into();
        for i in 0..MAX_DIG_RATE_PER_SEC {
            assert!(limiter.try_admit(&id, i as u64), "dig {i} should be admitted");
        }
        assert!(!limiter.try_admit(&id, MAX_DIG_RATE_PER_SEC as u64));
    }

    #[test]
    fn window_slides_forward() {
        let mut limiter = DigRateLimiter::new();
        let id: PlayerId = "p1".into();
        for i in 0..MAX_DIG_RATE_PER_SEC {
            limiter.try_admit(&id, i as u64);
        }
        assert!(!limiter.try_admit(&id, 500));
        assert!(limiter.try_admit(&id, 1_001));
    }

    #[test]
    fn players_have_independent_windows() {
        let mut limiter = DigRateLimiter::new();
        let a: PlayerId = "a".into();
        let b: PlayerId = "b".into();
        for i in 0..MAX_DIG_RATE_PER_SEC {
            limiter.try_admit(&a, i as u64);
        }
        assert!(!limiter.try_admit(&a, 0));
        assert!(limiter.try_admit(&b, 0));
    }

    #[test]
    fn chat_limiter_uses_its_own_cap() {
        let mut limiter = ChatRateLimiter::new();
        let id: PlayerId = "p1".into();
        for i in 0..CHAT_RATE_LIMIT_PER_SEC {
            assert!(limiter.try_admit(&id, i as u64), "chat {i} should be admitted");
        }
        assert!(!limiter.try_admit(&id, CHAT_RATE_LIMIT_PER_SEC as u64));
    }
}

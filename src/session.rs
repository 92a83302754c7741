//! Per-player sessions
//!
//! Each player owns one session holding their open rounds and burst
//! guard. A session is reached through its own async mutex, so actions
//! for one player serialize while distinct players stay fully parallel.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::games::{BlackjackRound, MinesRound};

/// Fixed-window action counter. The window restarts once it has fully
/// elapsed; inside a window the first `max` actions pass and the rest
/// are rejected.
#[derive(Debug, Clone)]
pub struct RateWindow {
    window_start: Instant,
    count: u32,
}

impl RateWindow {
    pub fn new() -> Self {
        Self {
            window_start: Instant::now(),
            count: 0,
        }
    }

    /// Count one action against the window and report whether it may
    /// proceed. Pure bookkeeping, no side effects beyond the counter.
    pub fn allow(&mut self, window: Duration, max: u32) -> bool {
        self.allow_at(Instant::now(), window, max)
    }

    fn allow_at(&mut self, now: Instant, window: Duration, max: u32) -> bool {
        if now.saturating_duration_since(self.window_start) > window {
            self.window_start = now;
            self.count = 0;
        }
        self.count += 1;
        self.count <= max
    }
}

impl Default for RateWindow {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the engine remembers about one player between actions.
#[derive(Debug)]
pub struct PlayerSession {
    pub blackjack: Option<BlackjackRound>,
    pub mines: Option<MinesRound>,
    pub rate: RateWindow,
    last_seen: Instant,
}

impl PlayerSession {
    pub fn new() -> Self {
        Self {
            blackjack: None,
            mines: None,
            rate: RateWindow::new(),
            last_seen: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_seen.elapsed()
    }

    fn has_open_round(&self) -> bool {
        self.blackjack.as_ref().map_or(false, |r| r.is_active())
            || self.mines.as_ref().map_or(false, |r| r.is_active())
    }
}

impl Default for PlayerSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Concurrent session registry keyed by player name.
#[derive(Default)]
pub struct SessionTable {
    sessions: DashMap<String, Arc<Mutex<PlayerSession>>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the player's session, creating it on first contact.
    pub fn entry(&self, name: &str) -> Arc<Mutex<PlayerSession>> {
        self.sessions
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(PlayerSession::new())))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop sessions idle longer than `max_idle`. Sessions currently
    /// locked by an action are always kept.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|name, session| {
            let Ok(guard) = session.try_lock() else {
                return true;
            };
            if guard.idle_for() <= max_idle {
                return true;
            }
            if guard.has_open_round() {
                warn!("Evicting idle session for {} with an unsettled round", name);
            } else {
                debug!("Evicting idle session for {}", name);
            }
            false
        });
        before.saturating_sub(self.sessions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_admits_up_to_the_limit() {
        let mut rate = RateWindow::new();
        let start = Instant::now();
        let window = Duration::from_millis(2_000);

        for _ in 0..15 {
            assert!(rate.allow_at(start, window, 15));
        }
        assert!(!rate.allow_at(start, window, 15), "16th action must fail");
        assert!(!rate.allow_at(start, window, 15), "and it stays closed");
    }

    #[test]
    fn test_window_resets_after_it_elapses() {
        let mut rate = RateWindow::new();
        let start = Instant::now();
        let window = Duration::from_millis(2_000);

        for _ in 0..16 {
            rate.allow_at(start, window, 15);
        }

        // exactly at the boundary the old window still applies
        let boundary = start + Duration::from_millis(2_000);
        assert!(!rate.allow_at(boundary, window, 15));

        let later = start + Duration::from_millis(2_001);
        assert!(rate.allow_at(later, window, 15), "fresh window admits again");
    }

    #[test]
    fn test_entry_returns_the_same_session() {
        let table = SessionTable::new();
        let first = table.entry("alice");
        let second = table.entry("alice");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(table.len(), 1);

        table.entry("bob");
        assert_eq!(table.len(), 2);
    }

    #[tokio::test]
    async fn test_eviction_skips_fresh_and_locked_sessions() {
        let table = SessionTable::new();
        table.entry("idle");
        let busy = table.entry("busy");

        // zero tolerance marks everything idle, but the held lock wins
        let _guard = busy.lock().await;
        let evicted = table.evict_idle(Duration::from_secs(0));
        assert_eq!(evicted, 1);
        assert_eq!(table.len(), 1);

        // generous tolerance keeps everyone
        table.entry("fresh");
        assert_eq!(table.evict_idle(Duration::from_secs(3_600)), 0);
        assert_eq!(table.len(), 2);
    }

    #[tokio::test]
    async fn test_evicted_player_gets_a_clean_session() {
        let table = SessionTable::new();
        {
            let session = table.entry("mallory");
            let mut guard = session.lock().await;
            guard.rate.allow(Duration::from_millis(2_000), 0);
        }
        table.evict_idle(Duration::from_secs(0));
        assert!(table.is_empty());

        let session = table.entry("mallory");
        let mut guard = session.lock().await;
        assert!(guard.rate.allow(Duration::from_millis(2_000), 1));
    }
}

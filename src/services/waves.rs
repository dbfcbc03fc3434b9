use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use crate::state::game::UserId;

/// Latest "o/" per user; only waves younger than the horizon count.
#[derive(Debug)]
pub struct WaveTracker {
    horizon: Duration,
    threshold: usize,
    waves: HashMap<UserId, Instant>,
}

impl WaveTracker {
    pub fn new(horizon: Duration, threshold: usize) -> Self {
        Self {
            horizon,
            threshold,
            waves: HashMap::new(),
        }
    }

    /// Record a wave, replacing the user's previous one.
    pub fn wave(&mut self, user: UserId, now: Instant) {
        self.waves.insert(user, now);
    }

    /// Number of waves younger than the horizon; stale entries are pruned.
    pub fn live(&mut self, now: Instant) -> usize {
        let horizon = self.horizon;
        self.waves
            .retain(|_, at| now.saturating_duration_since(*at) < horizon);
        self.waves.len()
    }

    /// Live wave count when it exceeds the ping threshold.
    pub fn check(&mut self, now: Instant) -> Option<usize> {
        let live = self.live(now);
        (live > self.threshold).then_some(live)
    }

    pub fn clear(&mut self) {
        self.waves.clear();
    }
}

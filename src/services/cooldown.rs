use std::time::{Duration, Instant};

/// Rate limiter for actions that must not repeat within `interval` (pins, pings, roster dumps).
#[derive(Debug, Clone)]
pub struct Cooldown {
    interval: Duration,
    last: Option<Instant>,
}

impl Cooldown {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Returns `true` and arms the cooldown when the action may run at `now`.
    pub fn try_fire(&mut self, now: Instant) -> bool {
        let ready = self
            .last
            .is_none_or(|last| now.saturating_duration_since(last) > self.interval);
        if ready {
            self.last = Some(now);
        }
        ready
    }
}

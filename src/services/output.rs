use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use tracing::{debug, warn};

use crate::config::Rules;

/// Last gate before text reaches the room: mute window, duplicate filter, length ceiling.
#[derive(Debug)]
pub struct OutputGate {
    muted_at: Option<Instant>,
    mute_for: Duration,
    default_mute: Duration,
    dedup_window: Duration,
    max_len: usize,
    recent: VecDeque<(Instant, String)>,
}

impl OutputGate {
    pub fn new(rules: &Rules) -> Self {
        Self {
            muted_at: None,
            mute_for: rules.default_mute,
            default_mute: rules.default_mute,
            dedup_window: rules.dedup_window,
            max_len: rules.max_message_len,
            recent: VecDeque::new(),
        }
    }

    /// Stay silent for `length` starting at `now`.
    pub fn mute(&mut self, length: Duration, now: Instant) {
        self.muted_at = Some(now);
        self.mute_for = length;
    }

    /// Lift any mute and restore the default mute length.
    pub fn unmute(&mut self) {
        self.muted_at = None;
        self.mute_for = self.default_mute;
    }

    pub fn is_muted(&self, now: Instant) -> bool {
        self.muted_at
            .is_some_and(|at| now.saturating_duration_since(at) <= self.mute_for)
    }

    /// Decide whether `text` may be posted now, remembering it for the duplicate filter.
    pub fn admit(&mut self, text: &str, length_check: bool, now: Instant) -> bool {
        if self.is_muted(now) {
            debug!("muted; dropping outbound message");
            return false;
        }

        if length_check && text.chars().count() > self.max_len {
            warn!(
                len = text.chars().count(),
                max = self.max_len,
                "outbound message too long; dropping"
            );
            return false;
        }

        while let Some((at, _)) = self.recent.front() {
            if now.saturating_duration_since(*at) > self.dedup_window {
                self.recent.pop_front();
            } else {
                break;
            }
        }

        if self.recent.iter().any(|(_, sent)| sent == text) {
            debug!("duplicate outbound message suppressed");
            return false;
        }

        self.recent.push_back((now, text.to_string()));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> OutputGate {
        OutputGate::new(&Rules::default())
    }

    #[test]
    fn identical_text_is_dropped_inside_window() {
        let now = Instant::now();
        let mut gate = gate();

        assert!(gate.admit("hello", true, now));
        assert!(!gate.admit("hello", true, now + Duration::from_secs(2)));
        assert!(gate.admit("other", true, now + Duration::from_secs(2)));
        assert!(gate.admit("hello", true, now + Duration::from_secs(6)));
    }

    #[test]
    fn mute_silences_until_expiry_or_unmute() {
        let now = Instant::now();
        let mut gate = gate();

        gate.mute(Duration::from_secs(60), now);
        assert!(!gate.admit("ping", true, now + Duration::from_secs(30)));
        assert!(gate.admit("ping", true, now + Duration::from_secs(61)));

        gate.mute(Duration::from_secs(60), now);
        gate.unmute();
        assert!(gate.admit("pong", true, now));
    }

    #[test]
    fn long_text_needs_length_check_disabled() {
        let now = Instant::now();
        let mut gate = gate();
        let long = "x".repeat(501);

        assert!(!gate.admit(&long, true, now));
        assert!(gate.admit(&long, false, now));
    }
}

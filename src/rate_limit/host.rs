//! Pacing state for one host.

use std::time::{Duration, Instant};

/// Spacing and backoff bookkeeping for a single host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPacingState {
    pub current_delay_ms: u64,
    pub consecutive_successes: u32,
    pub in_backoff: bool,
    pub total_requests: u64,
    pub rate_limit_hits: u64,
    /// When the most recently reserved request may go out.
    next_slot: Option<Instant>,
}

impl HostPacingState {
    pub(super) fn new(base_delay_ms: u64) -> Self {
        Self {
            current_delay_ms: base_delay_ms,
            consecutive_successes: 0,
            in_backoff: false,
            total_requests: 0,
            rate_limit_hits: 0,
            next_slot: None,
        }
    }

    /// Reserve the next request slot and return how long to wait for it.
    pub(super) fn reserve(&mut self, now: Instant) -> Duration {
        let slot = match self.next_slot {
            Some(previous) => {
                let earliest = previous + Duration::from_millis(self.current_delay_ms);
                earliest.max(now)
            }
            None => now,
        };
        self.next_slot = Some(slot);
        self.total_requests += 1;
        slot.saturating_duration_since(now)
    }
}
